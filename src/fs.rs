//! Filesystem abstraction consumed by the discovery walker and loader.
//!
//! The core never touches [`std::fs`] directly outside this module, so hosts
//! can substitute an in-memory or sandboxed filesystem (for tests, or to run
//! inside a restricted environment) by implementing [`Filesystem`].

use std::path::{Path, PathBuf};

/// Filesystem operations required by the discovery and loading subsystems.
pub trait Filesystem: Send + Sync {
    /// Returns `true` if `path` exists (file, directory, or symlink target).
    fn exists(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a directory that can be listed and read.
    fn is_directory_readable(&self, path: &Path) -> bool;

    /// Returns `true` if `path` is a regular file that can be opened for
    /// reading.
    fn is_file_readable(&self, path: &Path) -> bool;

    /// Reads the full contents of `path` as a UTF-8 string.
    fn read_file(&self, path: &Path) -> std::io::Result<String>;

    /// Resolves `path` to an absolute, symlink-free canonical path.
    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf>;
}

/// Default [`Filesystem`] implementation backed by [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_directory_readable(&self, path: &Path) -> bool {
        std::fs::read_dir(path).is_ok()
    }

    fn is_file_readable(&self, path: &Path) -> bool {
        std::fs::File::open(path)
            .map(|f| f.metadata().is_ok_and(|m| m.is_file()))
            .unwrap_or(false)
    }

    fn read_file(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> std::io::Result<PathBuf> {
        #[cfg(windows)]
        {
            dunce::canonicalize(path)
        }
        #[cfg(not(windows))]
        {
            std::fs::canonicalize(path)
        }
    }
}
