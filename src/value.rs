//! The dynamically-typed configuration value and its document container.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Keys that must never be assigned in any emitted document, at any depth.
///
/// These mirror the reserved names that would otherwise reach into a host
/// object's prototype chain in dynamically-typed ecosystems. The data model
/// here has no prototype chain, but a merged document is frequently handed to
/// callers that deserialize it with loosely-typed libraries, so the core
/// still refuses to carry these keys.
pub const UNSAFE_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Returns `true` if `key` must never be assigned in a [`Document`].
#[must_use]
pub fn is_unsafe_key(key: &str) -> bool {
    UNSAFE_KEYS.contains(&key)
}

/// An ordered mapping from string keys to [`Value`]s.
///
/// Insertion order is preserved for diagnostics (so error messages and
/// provenance reports read in a stable, human-meaningful order), but equality
/// is defined independently of order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(IndexMap<String, Value>);

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    /// Returns the value at `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Inserts `value` at `key`, silently refusing unsafe keys.
    ///
    /// Returns the previous value, if any. Assigning an unsafe key is a
    /// no-op: it returns `None` and leaves the document untouched.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        let key = key.into();
        if is_unsafe_key(&key) {
            return None;
        }
        self.0.insert(key, value)
    }

    /// Removes the value at `key`, if present.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns `true` if the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Reads a dot-path (`a.b.c`) from the document, descending through
    /// nested documents.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.get(first)?;
        for segment in segments {
            current = current.as_document()?.get(segment)?;
        }
        Some(current)
    }

    /// Writes `value` at a dot-path, creating intermediate documents as
    /// needed.
    ///
    /// Every segment of the path is checked against [`is_unsafe_key`]; if any
    /// segment is unsafe the write is skipped entirely and the document is
    /// left unchanged. This is the one primitive nested writes are permitted
    /// to use, so a single check here protects every caller.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        if segments.is_empty() || segments.iter().any(|segment| is_unsafe_key(segment)) {
            return;
        }
        Self::set_path_segments(self, &segments, value);
    }

    fn set_path_segments(doc: &mut Document, segments: &[&str], value: Value) {
        let Some((head, rest)) = segments.split_first() else {
            return;
        };
        if rest.is_empty() {
            doc.insert(*head, value);
            return;
        }
        let entry = doc
            .0
            .entry((*head).to_string())
            .or_insert_with(|| Value::Document(Document::new()));
        if !matches!(entry, Value::Document(_)) {
            *entry = Value::Document(Document::new());
        }
        if let Value::Document(child) = entry {
            Self::set_path_segments(child, rest, value);
        }
    }

    /// Flattens the document into the set of dot-paths it contains.
    ///
    /// Arrays of documents elide their index: `items: [{id: 1}]` contributes
    /// `items.id`, matching the schema's own elision rule so the two sets are
    /// directly comparable.
    #[must_use]
    pub fn flatten_paths(&self) -> std::collections::BTreeSet<String> {
        let mut out = std::collections::BTreeSet::new();
        Self::flatten_into(self, None, &mut out);
        out
    }

    fn flatten_into(doc: &Document, prefix: Option<&str>, out: &mut std::collections::BTreeSet<String>) {
        for (key, value) in doc.iter() {
            let path = match prefix {
                Some(p) => format!("{p}.{key}"),
                None => key.clone(),
            };
            match value {
                Value::Document(nested) => {
                    out.insert(path.clone());
                    Self::flatten_into(nested, Some(&path), out);
                }
                Value::Array(items) => {
                    out.insert(path.clone());
                    for item in items {
                        if let Value::Document(nested) = item {
                            Self::flatten_into(nested, Some(&path), out);
                        }
                    }
                }
                _ => {
                    out.insert(path);
                }
            }
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0
            .iter()
            .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut doc = Document::new();
        for (key, value) in iter {
            doc.insert(key, value);
        }
        doc
    }
}

/// A dynamically-typed configuration value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// The absence of a value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A signed 64-bit integer.
    Int(i64),
    /// A 64-bit floating point number.
    Float(f64),
    /// A UTF-8 string.
    String(String),
    /// An ordered, non-deduplicated sequence of values.
    Array(Vec<Value>),
    /// A nested document.
    Document(Document),
}

impl Value {
    /// Returns the value as a [`Document`] reference, if it is one.
    #[must_use]
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the value as a mutable [`Document`] reference, if it is one.
    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Returns the value as an array slice, if it is one.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the value as a string slice, if it is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as a 64-bit float, if it is numeric.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns `true` if this value is [`Value::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Value::Document(doc) => {
                write!(f, "{{")?;
                for (i, (key, value)) in doc.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsafe_key_insert_is_noop() {
        let mut doc = Document::new();
        doc.insert("__proto__", Value::String("polluted".into()));
        assert!(doc.get("__proto__").is_none());
        assert!(doc.is_empty());
    }

    #[test]
    fn unsafe_segment_in_nested_write_is_rejected() {
        let mut doc = Document::new();
        doc.set_path("__proto__.polluted", Value::String("x".into()));
        assert!(doc.is_empty());

        let mut doc = Document::new();
        doc.set_path("a.constructor.b", Value::Int(1));
        assert!(doc.is_empty());
    }

    #[test]
    fn set_path_creates_intermediate_documents() {
        let mut doc = Document::new();
        doc.set_path("database.host", Value::String("localhost".into()));
        assert_eq!(
            doc.get_path("database.host"),
            Some(&Value::String("localhost".into()))
        );
    }

    #[test]
    fn equality_is_order_independent() {
        let mut a = Document::new();
        a.insert("x", Value::Int(1));
        a.insert("y", Value::Int(2));

        let mut b = Document::new();
        b.insert("y", Value::Int(2));
        b.insert("x", Value::Int(1));

        assert_eq!(a, b);
    }

    #[test]
    fn flatten_paths_elides_array_indices() {
        let mut item = Document::new();
        item.insert("id", Value::Int(1));
        let mut doc = Document::new();
        doc.insert("items", Value::Array(vec![Value::Document(item)]));

        let paths = doc.flatten_paths();
        assert!(paths.contains("items"));
        assert!(paths.contains("items.id"));
    }
}
