//! Relative-to-absolute path resolution, alternate-extension fallback, and
//! sanitization helpers shared by the loader and security validator.

use std::path::{Path, PathBuf};

/// Canonicalises `path`, resolving symlinks and normalising separators.
///
/// On Windows this uses [`dunce::canonicalize`] to avoid introducing UNC
/// prefixes into diagnostic messages.
///
/// # Errors
///
/// Returns the underlying I/O error if canonicalization fails.
pub fn canonicalize(path: &Path) -> std::io::Result<PathBuf> {
    #[cfg(windows)]
    {
        dunce::canonicalize(path)
    }
    #[cfg(not(windows))]
    {
        std::fs::canonicalize(path)
    }
}

/// Resolves a string value that may reference a relative path against
/// `base_dir`.
///
/// - Absolute paths are returned unchanged.
/// - `file://…` URIs are stripped of their scheme and treated as a plain
///   path.
/// - `http://` and `https://` URIs are rejected; callers should surface this
///   as a configuration error rather than attempting a fetch.
/// - Everything else is treated as relative to `base_dir`.
#[must_use]
pub fn resolve_relative(base_dir: &Path, value: &str) -> Option<PathBuf> {
    if value.starts_with("http://") || value.starts_with("https://") {
        return None;
    }
    if let Some(stripped) = value.strip_prefix("file://") {
        return Some(PathBuf::from(stripped));
    }
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        return Some(candidate.to_path_buf());
    }
    Some(base_dir.join(candidate))
}

/// Builds the alternate-extension fallback candidate for YAML files.
///
/// `config.yaml` falls back to `config.yml` and vice versa; every other
/// extension has no fallback.
#[must_use]
pub fn yaml_extension_fallback(path: &Path) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?;
    let alternate = match ext.to_ascii_lowercase().as_str() {
        "yaml" => "yml",
        "yml" => "yaml",
        _ => return None,
    };
    Some(path.with_extension(alternate))
}

/// Returns `true` if `path` contains a `..` segment after lexical
/// normalisation, without touching the filesystem.
#[must_use]
pub fn has_parent_traversal(path: &str) -> bool {
    Path::new(path)
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_http_schemes() {
        assert!(resolve_relative(Path::new("/base"), "http://example.com/x").is_none());
        assert!(resolve_relative(Path::new("/base"), "https://example.com/x").is_none());
    }

    #[test]
    fn strips_file_scheme() {
        let resolved = resolve_relative(Path::new("/base"), "file:///etc/passwd").unwrap();
        assert_eq!(resolved, PathBuf::from("/etc/passwd"));
    }

    #[test]
    fn absolute_paths_pass_through() {
        let resolved = resolve_relative(Path::new("/base"), "/abs/path").unwrap();
        assert_eq!(resolved, PathBuf::from("/abs/path"));
    }

    #[test]
    fn relative_paths_join_base() {
        let resolved = resolve_relative(Path::new("/base"), "sub/file.txt").unwrap();
        assert_eq!(resolved, PathBuf::from("/base/sub/file.txt"));
    }

    #[test]
    fn yaml_fallback_swaps_extension() {
        assert_eq!(
            yaml_extension_fallback(Path::new("config.yaml")),
            Some(PathBuf::from("config.yml"))
        );
        assert_eq!(
            yaml_extension_fallback(Path::new("config.yml")),
            Some(PathBuf::from("config.yaml"))
        );
        assert_eq!(yaml_extension_fallback(Path::new("config.json")), None);
    }

    #[test]
    fn detects_parent_traversal() {
        assert!(has_parent_traversal("../secrets"));
        assert!(has_parent_traversal("a/../../b"));
        assert!(!has_parent_traversal("a/b/c"));
    }
}
