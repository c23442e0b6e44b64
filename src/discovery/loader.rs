//! Per-directory loading: candidate resolution, format priority, parsing,
//! and path-field rewriting.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::fs::Filesystem;
use crate::logger::Logger;
use crate::parser::{ConfigFormat, EXTENSION_SEARCH_ORDER, Parser};
use crate::path_utils::{resolve_relative, yaml_extension_fallback};
use crate::value::{Document, Value};

/// Describes which fields of a loaded document hold relative paths that must
/// be rewritten to absolute paths anchored at the config directory.
#[derive(Debug, Clone, Default)]
pub struct PathResolutionSpec {
    /// Dot-paths whose string value should be resolved.
    pub scalar_fields: Vec<String>,
    /// Dot-paths whose array elements should each be resolved, when they are
    /// strings.
    pub array_fields: Vec<String>,
    /// Dot-paths whose map values should each be resolved, when they are
    /// strings.
    pub map_fields: Vec<String>,
}

/// The result of loading a single directory's configuration file.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// Absolute path to the file that was loaded.
    pub path: PathBuf,
    /// Format the file was parsed as.
    pub format: ConfigFormat,
    /// The parsed, path-resolved document.
    pub value: Value,
}

/// Attempts to load `config_file_name` from `config_dir`.
///
/// Returns `Ok(None)` if no candidate file exists. Filesystem and parse
/// errors are never returned here — per the loader's swallow-and-continue
/// contract, callers that need to surface them should inspect the debug log
/// produced via `logger`.
pub fn load_config_dir(
    config_dir: &Path,
    config_file_name: &str,
    explicit_format: Option<ConfigFormat>,
    fs: &dyn Filesystem,
    parser: &dyn Parser,
    logger: &dyn Logger,
    path_spec: Option<&PathResolutionSpec>,
) -> Option<LoadedConfig> {
    let candidates = candidate_paths(config_dir, config_file_name, explicit_format);

    for (path, format) in candidates {
        if !fs.is_file_readable(&path) {
            continue;
        }
        match load_one(&path, format, fs, parser) {
            Ok(mut value) => {
                if let Some(spec) = path_spec {
                    if let Some(doc) = value.as_document_mut() {
                        resolve_path_fields(doc, config_dir, spec);
                    }
                }
                return Some(LoadedConfig { path, format, value });
            }
            Err(err) => {
                logger.debug(&format!(
                    "discovery: failed to load {}: {err}",
                    path.display()
                ));
            }
        }
    }
    None
}

/// Builds the ordered list of `(path, format)` candidates for a directory,
/// honouring the extension search order and the YAML `.yaml`/`.yml`
/// fallback.
fn candidate_paths(
    config_dir: &Path,
    config_file_name: &str,
    explicit_format: Option<ConfigFormat>,
) -> Vec<(PathBuf, ConfigFormat)> {
    if let Some(format) = explicit_format {
        let path = config_dir.join(with_extension(config_file_name, format.extension()));
        let mut out = vec![(path.clone(), format)];
        if format == ConfigFormat::Yaml {
            if let Some(alt) = yaml_extension_fallback(&path) {
                out.push((alt, format));
            }
        }
        return out;
    }

    let stem = Path::new(config_file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(config_file_name);

    EXTENSION_SEARCH_ORDER
        .iter()
        .filter_map(|ext| {
            ConfigFormat::from_extension(ext).map(|format| (config_dir.join(format!("{stem}.{ext}")), format))
        })
        .collect()
}

fn with_extension(file_name: &str, ext: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    format!("{stem}.{ext}")
}

fn load_one(
    path: &Path,
    format: ConfigFormat,
    fs: &dyn Filesystem,
    parser: &dyn Parser,
) -> Result<Value, ConfigError> {
    let text = fs
        .read_file(path)
        .map_err(|source| ConfigError::NotReadable {
            path: path.to_path_buf(),
            source,
        })?;
    let value = parser.parse(format, &text)?;
    if value.as_document().is_none() {
        return Err(ConfigError::OperationFailed {
            message: format!(
                "{}: document root must be a map, found a non-map value",
                path.display()
            ),
        });
    }
    Ok(value)
}

fn resolve_path_fields(doc: &mut Document, base_dir: &Path, spec: &PathResolutionSpec) {
    for field in &spec.scalar_fields {
        if let Some(Value::String(s)) = doc.get_path(field).cloned().as_ref() {
            if let Some(resolved) = resolve_relative(base_dir, s) {
                doc.set_path(field, Value::String(path_to_string(&resolved)));
            }
        }
    }
    for field in &spec.array_fields {
        let rewritten = doc.get_path(field).and_then(Value::as_array).map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => resolve_relative(base_dir, s)
                        .map(|p| Value::String(path_to_string(&p)))
                        .unwrap_or_else(|| item.clone()),
                    other => other.clone(),
                })
                .collect::<Vec<_>>()
        });
        if let Some(items) = rewritten {
            doc.set_path(field, Value::Array(items));
        }
    }
    for field in &spec.map_fields {
        let rewritten = doc.get_path(field).and_then(Value::as_document).map(|map| {
            let mut out = Document::new();
            for (key, value) in map.iter() {
                let new_value = match value {
                    Value::String(s) => resolve_relative(base_dir, s)
                        .map(|p| Value::String(path_to_string(&p)))
                        .unwrap_or_else(|| value.clone()),
                    other => other.clone(),
                };
                out.insert(key.clone(), new_value);
            }
            out
        });
        if let Some(map) = rewritten {
            doc.set_path(field, Value::Document(map));
        }
    }
}

fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin_parsers::BuiltinParser;
    use crate::fs::StdFilesystem;
    use crate::logger::NoOpLogger;

    #[test]
    fn loads_highest_priority_format_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.json"), r#"{"a": 1}"#).expect("write json");
        std::fs::write(dir.path().join("config.yaml"), "a: 2\n").expect("write yaml");

        let loaded = load_config_dir(
            dir.path(),
            "config",
            None,
            &StdFilesystem,
            &BuiltinParser,
            &NoOpLogger,
            None,
        )
        .expect("a config should load");
        assert_eq!(loaded.format, ConfigFormat::Json);
    }

    #[test]
    fn yaml_extension_fallback_is_tried() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.yml"), "a: 2\n").expect("write yaml");

        let loaded = load_config_dir(
            dir.path(),
            "config.yaml",
            Some(ConfigFormat::Yaml),
            &StdFilesystem,
            &BuiltinParser,
            &NoOpLogger,
            None,
        )
        .expect("fallback should load config.yml");
        assert_eq!(loaded.path, dir.path().join("config.yml"));
    }

    #[test]
    fn candidate_paths_covers_the_full_extension_search_order() {
        let dir = PathBuf::from("/cfg");
        let candidates = candidate_paths(&dir, "config", None);
        let extensions: Vec<&str> = candidates
            .iter()
            .map(|(path, _)| path.extension().and_then(|e| e.to_str()).unwrap())
            .collect();
        assert_eq!(
            extensions,
            vec!["ts", "mts", "cts", "js", "mjs", "cjs", "json", "yaml", "yml"]
        );
    }

    #[test]
    fn mjs_only_directory_is_probed() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.mjs"), "export default {}").expect("write mjs");

        let candidates = candidate_paths(dir.path(), "config", None);
        assert!(
            candidates
                .iter()
                .any(|(path, format)| path == &dir.path().join("config.mjs") && *format == ConfigFormat::Js)
        );
    }

    #[test]
    fn non_map_root_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.json"), "[1, 2, 3]").expect("write json");

        let loaded = load_config_dir(
            dir.path(),
            "config",
            None,
            &StdFilesystem,
            &BuiltinParser,
            &NoOpLogger,
            None,
        );
        assert!(loaded.is_none());
    }

    #[test]
    fn scalar_path_field_resolved_relative_to_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.json"), r#"{"out": "build"}"#)
            .expect("write json");

        let spec = PathResolutionSpec {
            scalar_fields: vec!["out".to_string()],
            ..Default::default()
        };
        let loaded = load_config_dir(
            dir.path(),
            "config",
            None,
            &StdFilesystem,
            &BuiltinParser,
            &NoOpLogger,
            Some(&spec),
        )
        .expect("config should load");
        let doc = loaded.value.as_document().expect("document");
        assert_eq!(
            doc.get("out"),
            Some(&Value::String(
                dir.path().join("build").to_string_lossy().into_owned()
            ))
        );
    }
}
