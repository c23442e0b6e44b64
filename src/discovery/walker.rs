//! The upward filesystem walk.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::fs::Filesystem;
use crate::logger::Logger;

use super::{DiscoveredConfigDir, WalkMode, WalkOptions};

/// Walks upward from `starting_dir`, returning every directory that contains
/// a readable `config_dir_name` subdirectory.
///
/// Level 0 is the starting directory; each ancestor increases the level by
/// one. The walk never panics or propagates filesystem errors — a single
/// unreadable directory is logged at debug and skipped, matching the
/// loader's own swallow-and-continue contract.
pub fn walk(
    starting_dir: &Path,
    fs: &dyn Filesystem,
    options: &WalkOptions,
    logger: &dyn Logger,
) -> Vec<DiscoveredConfigDir> {
    let mut results = Vec::new();
    let mut visited: HashSet<PathBuf> = HashSet::new();

    let mut current = canonical_or_original(fs, starting_dir);
    let mut level = 0u32;

    loop {
        // Cycle guard: a symlink loop can make ascent revisit a canonical
        // path already processed. Stop rather than looping forever.
        if !visited.insert(current.clone()) {
            logger.debug(&format!(
                "discovery: cycle detected at {}, stopping walk",
                current.display()
            ));
            break;
        }

        let found_here = record_if_present(&current, fs, options, logger, level, &mut results);

        match options.mode {
            WalkMode::Disabled | WalkMode::Explicit => break,
            WalkMode::RootOnly if found_here => break,
            _ => {}
        }

        let Some(parent) = current.parent() else {
            break;
        };
        if parent == current {
            break;
        }
        if level >= options.max_depth {
            break;
        }
        if basename_matches(&current, &options.stop_at) {
            break;
        }
        if options.stop_at_root && has_root_marker(&current, fs, &options.root_markers) {
            break;
        }

        current = canonical_or_original(fs, parent);
        level += 1;
    }

    results
}

fn canonical_or_original(fs: &dyn Filesystem, path: &Path) -> PathBuf {
    fs.canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn record_if_present(
    current: &Path,
    fs: &dyn Filesystem,
    options: &WalkOptions,
    logger: &dyn Logger,
    level: u32,
    results: &mut Vec<DiscoveredConfigDir>,
) -> bool {
    let candidate = current.join(&options.config_dir_name);
    if !fs.exists(&candidate) {
        return false;
    }
    if !fs.is_directory_readable(&candidate) {
        logger.debug(&format!(
            "discovery: {} exists but is not a readable directory, skipping",
            candidate.display()
        ));
        return false;
    }
    let path = canonical_or_original(fs, &candidate);
    results.push(DiscoveredConfigDir { path, level });
    true
}

fn basename_matches(path: &Path, stop_at: &[String]) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| stop_at.iter().any(|s| s == name))
}

fn has_root_marker(dir: &Path, fs: &dyn Filesystem, markers: &[String]) -> bool {
    markers.iter().any(|marker| fs.exists(&dir.join(marker)))
}
