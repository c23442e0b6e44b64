//! Hierarchical discovery & walk engine.
//!
//! [`walk`] locates configuration directories by walking the filesystem
//! upward from a starting directory, honouring cycle, depth and root-marker
//! controls. [`loader`] turns each [`DiscoveredConfigDir`] into a parsed
//! document.

mod loader;
mod walker;

pub use loader::{LoadedConfig, PathResolutionSpec, load_config_dir};
pub use walker::walk;

use std::path::PathBuf;

/// The default root-marker filenames that suppress discovery above a
/// project boundary. Chosen to cover the ecosystems a CLI tool is most
/// likely to be invoked from.
pub const DEFAULT_ROOT_MARKERS: [&str; 6] = [
    ".git",
    "package.json",
    "Cargo.toml",
    "go.mod",
    "pyproject.toml",
    "pom.xml",
];

/// The default maximum number of levels the walker will ascend.
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Controls how far upward the walker searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Look only at the starting directory; ignore root markers.
    Disabled,
    /// Identical to `Disabled`: levels above 0 are never produced.
    Explicit,
    /// Return the first hit and stop; no merge occurs downstream.
    RootOnly,
    /// Walk upward until a stop condition fires.
    Enabled,
}

/// Options controlling a single [`walk`] invocation.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// The name of the configuration directory to look for at each level
    /// (for example, `.myapp`).
    pub config_dir_name: String,
    /// Maximum number of levels to ascend.
    pub max_depth: u32,
    /// Directory basenames that halt the walk once reached.
    pub stop_at: Vec<String>,
    /// Filenames whose presence marks a project root.
    pub root_markers: Vec<String>,
    /// Whether a root marker halts ascent past that directory.
    pub stop_at_root: bool,
    /// The walk mode.
    pub mode: WalkMode,
}

impl WalkOptions {
    /// Creates walk options for `config_dir_name` with every other field at
    /// its spec-mandated default.
    #[must_use]
    pub fn new(config_dir_name: impl Into<String>) -> Self {
        Self {
            config_dir_name: config_dir_name.into(),
            max_depth: DEFAULT_MAX_DEPTH,
            stop_at: Vec::new(),
            root_markers: DEFAULT_ROOT_MARKERS.iter().map(|s| (*s).to_string()).collect(),
            stop_at_root: true,
            mode: WalkMode::Enabled,
        }
    }
}

/// An upward-discovered configuration directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredConfigDir {
    /// Absolute, normalized, `..`-free path to the directory.
    pub path: PathBuf,
    /// Distance from the starting directory; 0 is nearest.
    pub level: u32,
}
