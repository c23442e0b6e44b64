//! Schema-driven validator: key-universe flattening, extra-key detection,
//! and the `validate()` state machine.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::{ConfigError, ExtraKeysDetail, ValidationDetail};
use crate::fs::Filesystem;
use crate::value::Document;

/// The structural kind of a schema field, as reported by [`SchemaTraversal`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// A leaf value (string, number, bool, etc.).
    Scalar,
    /// A nested object whose children are separately enumerated.
    Object,
    /// An array of scalars.
    Array,
    /// An array of objects; children are enumerated with the index elided.
    ArrayOfObjects,
    /// A map-like node whose descendants are unconstrained.
    OpenMap,
    /// A node that accepts any shape.
    Any,
}

/// One entry in a schema's flattened field list, as produced by a
/// [`SchemaTraversal`] implementation.
#[derive(Debug, Clone)]
pub struct SchemaField {
    /// Dot-path of this field.
    pub path: String,
    /// Structural kind.
    pub kind: FieldKind,
}

/// Top-level keys every key universe allows regardless of what the schema
/// declares, so provenance metadata never triggers an extra-key failure.
pub const ALWAYS_ALLOWED_KEYS: [&str; 3] = [
    "configDirectory",
    "discoveredConfigDirs",
    "resolvedConfigDirs",
];

/// A structural description of a host's configuration schema.
///
/// Hosts implement this once per schema library they integrate (for
/// example, a JSON Schema wrapper or a hand-rolled struct descriptor); the
/// core never parses or owns the schema itself.
pub trait SchemaTraversal {
    /// Iterates every field the schema declares, already flattened to
    /// dot-paths with `OpenMap`/`Any` nodes terminating expansion at their
    /// own path.
    fn fields(&self) -> Vec<SchemaField>;

    /// Runs the host's own structural validator against `document`.
    ///
    /// # Errors
    ///
    /// Returns one [`ValidationDetail`] per field that failed to validate.
    fn validate_values(&self, document: &Document) -> Result<(), Vec<ValidationDetail>>;

    /// Returns `true` if the `config` (directory-backed) feature is enabled
    /// for this schema, gating the directory-existence check.
    fn config_feature_enabled(&self) -> bool {
        false
    }

    /// Returns `true` if `configDirectory` must exist for this schema to be
    /// considered valid.
    fn config_directory_required(&self) -> bool {
        false
    }
}

/// The key universe `K` derived from a schema: every dot-path an
/// unconstrained configuration may contain, plus the set of paths that are
/// "open prefixes" (any key beneath them is implicitly allowed).
#[derive(Debug, Clone, Default)]
pub struct KeyUniverse {
    /// Every explicitly allowed dot-path.
    pub allowed: BTreeSet<String>,
    /// Dot-paths whose descendants are all implicitly allowed.
    pub open_prefixes: BTreeSet<String>,
}

impl KeyUniverse {
    /// Flattens `schema` into a [`KeyUniverse`], adding the always-allowed
    /// top-level keys.
    #[must_use]
    pub fn flatten(schema: &dyn SchemaTraversal) -> Self {
        let mut universe = Self::default();
        for key in ALWAYS_ALLOWED_KEYS {
            universe.allowed.insert(key.to_string());
        }
        for field in schema.fields() {
            universe.allowed.insert(field.path.clone());
            if matches!(field.kind, FieldKind::OpenMap | FieldKind::Any) {
                universe.open_prefixes.insert(field.path);
            }
        }
        universe
    }

    /// Returns `true` if `path` is allowed: either explicitly present, or
    /// nested beneath an open prefix.
    #[must_use]
    pub fn allows(&self, path: &str) -> bool {
        if self.allowed.contains(path) {
            return true;
        }
        self.open_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix) && path[prefix.len()..].starts_with('.'))
    }
}

/// Flattens `document` to its dot-path set and compares it against `universe`,
/// returning the offending keys (if any).
#[must_use]
pub fn detect_extra_keys(document: &Document, universe: &KeyUniverse) -> Vec<String> {
    document
        .flatten_paths()
        .into_iter()
        .filter(|path| !universe.allows(path))
        .collect()
}

/// Runs the `validate()` state machine: `CHECK_DIRECTORY` →
/// `CHECK_EXTRA_KEYS` → `CHECK_SCHEMA` → `OK`.
///
/// A failure in any state aborts the remaining states and returns a single
/// typed error describing that state's failure; states never combine
/// multiple categories of error into one result.
///
/// # Errors
///
/// Returns [`ConfigError::NotFound`]/[`ConfigError::NotReadable`] if the
/// directory check fails, [`ConfigError::ExtraKeys`] if the document
/// contains keys outside the schema's universe, or
/// [`ConfigError::Validation`] if the schema's structural validator rejects
/// a value.
pub fn validate(
    document: &Document,
    schema: &dyn SchemaTraversal,
    fs: &dyn Filesystem,
) -> Result<(), ConfigError> {
    check_directory(document, schema, fs)?;

    let universe = KeyUniverse::flatten(schema);
    let offending = detect_extra_keys(document, &universe);
    if !offending.is_empty() {
        return Err(ConfigError::ExtraKeys(ExtraKeysDetail {
            offending,
            allowed: universe.allowed.into_iter().collect(),
        }));
    }

    schema
        .validate_values(document)
        .map_err(ConfigError::Validation)?;

    Ok(())
}

fn check_directory(
    document: &Document,
    schema: &dyn SchemaTraversal,
    fs: &dyn Filesystem,
) -> Result<(), ConfigError> {
    if !schema.config_feature_enabled() {
        return Ok(());
    }
    let Some(dir) = document.get("configDirectory").and_then(|v| v.as_str()) else {
        return Ok(());
    };
    let path = Path::new(dir);
    if !fs.exists(path) {
        if schema.config_directory_required() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        return Ok(());
    }
    if !fs.is_directory_readable(path) {
        return Err(ConfigError::NotReadable {
            path: path.to_path_buf(),
            source: std::io::Error::new(
                std::io::ErrorKind::PermissionDenied,
                "configDirectory exists but cannot be read",
            ),
        });
    }
    Ok(())
}
