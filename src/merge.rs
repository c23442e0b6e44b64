//! Precedence-aware deep merger.
//!
//! [`merge_all`] combines an ordered list of documents, lowest precedence
//! first, applying per-path array-overlap rules and refusing to assign
//! unsafe keys anywhere in the result.

use std::collections::HashMap;

use crate::value::{Document, Value, is_unsafe_key};

/// How two arrays at the same path are combined when both sides define one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayOverlap {
    /// The higher-precedence array entirely replaces the lower one. The
    /// default when no rule applies.
    Override,
    /// Lower-precedence elements first, then higher-precedence elements.
    Append,
    /// Higher-precedence elements first, then lower-precedence elements.
    Prepend,
}

/// Maps dot-paths to the [`ArrayOverlap`] policy that applies at that path.
///
/// Lookup walks from the exact path to progressively shorter prefixes
/// (`a.b.c` → `a.b` → `a`) before falling back to [`ArrayOverlap::Override`],
/// so a rule registered on a parent path applies to every array found
/// anywhere under that subtree.
#[derive(Debug, Clone, Default)]
pub struct OverlapRules(HashMap<String, ArrayOverlap>);

impl OverlapRules {
    /// Creates an empty rule table; every array merge falls back to
    /// [`ArrayOverlap::Override`].
    #[must_use]
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Registers a rule for `path`.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, rule: ArrayOverlap) -> Self {
        self.0.insert(path.into(), rule);
        self
    }

    /// Resolves the effective rule for `path`, trying progressively shorter
    /// prefixes before defaulting to [`ArrayOverlap::Override`].
    #[must_use]
    pub fn resolve(&self, path: &str) -> ArrayOverlap {
        if let Some(rule) = self.0.get(path) {
            return *rule;
        }
        let mut segments: Vec<&str> = path.split('.').collect();
        while segments.len() > 1 {
            segments.pop();
            let prefix = segments.join(".");
            if let Some(rule) = self.0.get(&prefix) {
                return *rule;
            }
        }
        ArrayOverlap::Override
    }
}

/// Merges an ordered list of documents, lowest precedence first.
///
/// Returns an empty document for an empty input.
#[must_use]
pub fn merge_all(documents: &[Document], rules: &OverlapRules) -> Document {
    let mut iter = documents.iter();
    let Some(first) = iter.next() else {
        return Document::new();
    };
    let mut acc = first.clone();
    for next in iter {
        acc = merge_documents(&acc, next, rules, "");
    }
    acc
}

fn merge_documents(acc: &Document, next: &Document, rules: &OverlapRules, path: &str) -> Document {
    let mut out = Document::new();
    for (key, value) in acc.iter() {
        out.insert(key.clone(), value.clone());
    }
    for (key, next_value) in next.iter() {
        if is_unsafe_key(key) {
            continue;
        }
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        let merged = match out.get(key) {
            None => next_value.clone(),
            Some(acc_value) => merge_value(acc_value, next_value, rules, &child_path),
        };
        out.insert(key.clone(), merged);
    }
    out
}

fn merge_value(acc: &Value, next: &Value, rules: &OverlapRules, path: &str) -> Value {
    match (acc, next) {
        // Rule 1: null yields to the other side.
        (Value::Null, other) | (other, Value::Null) => other.clone(),
        // Rule 2: both maps recurse key by key.
        (Value::Document(a), Value::Document(b)) => {
            Value::Document(merge_documents(a, b, rules, path))
        }
        // Rule 3: both arrays consult the overlap table.
        (Value::Array(a), Value::Array(b)) => match rules.resolve(path) {
            ArrayOverlap::Override => Value::Array(b.clone()),
            ArrayOverlap::Append => {
                let mut out = a.clone();
                out.extend(b.iter().cloned());
                Value::Array(out)
            }
            ArrayOverlap::Prepend => {
                let mut out = b.clone();
                out.extend(a.iter().cloned());
                Value::Array(out)
            }
        },
        // Rule 4 & 5: any other combination (map-vs-array, or two
        // primitives) replaces with the higher-precedence side.
        (_, higher) => higher.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(pairs: &[(&str, Value)]) -> Document {
        let mut d = Document::new();
        for (k, v) in pairs {
            d.insert(*k, v.clone());
        }
        d
    }

    #[test]
    fn three_level_hierarchy_merge_matches_scenario() {
        let mut outer_db = Document::new();
        outer_db.insert("host", Value::String("prod.db".into()));
        outer_db.insert("ssl", Value::Bool(true));
        let mut outer_log = Document::new();
        outer_log.insert("level", Value::String("warn".into()));
        let outer = doc(&[
            ("database", Value::Document(outer_db)),
            ("logging", Value::Document(outer_log)),
        ]);

        let mut mid_db = Document::new();
        mid_db.insert("host", Value::String("team.db".into()));
        let mut mid_api = Document::new();
        mid_api.insert("timeout", Value::Int(3000));
        let mid = doc(&[
            ("database", Value::Document(mid_db)),
            ("api", Value::Document(mid_api)),
        ]);

        let mut inner_db = Document::new();
        inner_db.insert("host", Value::String("localhost".into()));
        let mut inner_log = Document::new();
        inner_log.insert("level", Value::String("debug".into()));
        let inner = doc(&[
            ("database", Value::Document(inner_db)),
            ("logging", Value::Document(inner_log)),
        ]);

        let merged = merge_all(&[outer, mid, inner], &OverlapRules::new());

        assert_eq!(
            merged.get_path("database.host"),
            Some(&Value::String("localhost".into()))
        );
        assert_eq!(merged.get_path("database.ssl"), Some(&Value::Bool(true)));
        assert_eq!(merged.get_path("api.timeout"), Some(&Value::Int(3000)));
        assert_eq!(
            merged.get_path("logging.level"),
            Some(&Value::String("debug".into()))
        );
    }

    #[test]
    fn scope_roots_deep_merge_unions_keys() {
        let mut lower_roots = Document::new();
        lower_roots.insert("@x", Value::String("../x".into()));
        lower_roots.insert("@y", Value::String("../y".into()));
        let lower = doc(&[("scopeRoots", Value::Document(lower_roots))]);

        let mut higher_roots = Document::new();
        higher_roots.insert("@z", Value::String("../z".into()));
        let higher = doc(&[("scopeRoots", Value::Document(higher_roots))]);

        let merged = merge_all(&[lower, higher], &OverlapRules::new());
        let roots = merged.get("scopeRoots").and_then(Value::as_document).expect("doc");
        assert_eq!(roots.len(), 3);
        assert!(roots.get("@x").is_some());
        assert!(roots.get("@y").is_some());
        assert!(roots.get("@z").is_some());
    }

    #[test]
    fn array_overlap_modes() {
        let lower = doc(&[(
            "features",
            Value::Array(vec![Value::String("auth".into())]),
        )]);
        let higher = doc(&[(
            "features",
            Value::Array(vec![Value::String("analytics".into())]),
        )]);

        let appended = merge_all(
            &[lower.clone(), higher.clone()],
            &OverlapRules::new().with("features", ArrayOverlap::Append),
        );
        assert_eq!(
            appended.get("features"),
            Some(&Value::Array(vec![
                Value::String("auth".into()),
                Value::String("analytics".into())
            ]))
        );

        let prepended = merge_all(
            &[lower.clone(), higher.clone()],
            &OverlapRules::new().with("features", ArrayOverlap::Prepend),
        );
        assert_eq!(
            prepended.get("features"),
            Some(&Value::Array(vec![
                Value::String("analytics".into()),
                Value::String("auth".into())
            ]))
        );

        let overridden = merge_all(&[lower.clone(), higher.clone()], &OverlapRules::new());
        assert_eq!(
            overridden.get("features"),
            Some(&Value::Array(vec![Value::String("analytics".into())]))
        );
    }

    #[test]
    fn prototype_pollution_is_dropped() {
        let lower = Document::new();
        let mut higher = Document::new();
        higher.set_path("__proto__.polluted", Value::String("x".into()));

        let merged = merge_all(&[lower, higher], &OverlapRules::new());
        assert!(merged.is_empty());
        assert!(merged.get("__proto__").is_none());
    }

    #[test]
    fn parent_path_rule_applies_to_nested_arrays() {
        let lower = doc(&[(
            "build",
            Value::Document(doc(&[(
                "flags",
                Value::Array(vec![Value::String("a".into())]),
            )])),
        )]);
        let higher = doc(&[(
            "build",
            Value::Document(doc(&[(
                "flags",
                Value::Array(vec![Value::String("b".into())]),
            )])),
        )]);

        let merged = merge_all(
            &[lower, higher],
            &OverlapRules::new().with("build", ArrayOverlap::Append),
        );
        assert_eq!(
            merged.get_path("build.flags"),
            Some(&Value::Array(vec![
                Value::String("a".into()),
                Value::String("b".into())
            ]))
        );
    }

    #[test]
    fn map_vs_array_replaces_with_higher_precedence() {
        let lower = doc(&[("thing", Value::Document(Document::new()))]);
        let higher = doc(&[("thing", Value::Array(vec![Value::Int(1)]))]);
        let merged = merge_all(&[lower, higher], &OverlapRules::new());
        assert_eq!(merged.get("thing"), Some(&Value::Array(vec![Value::Int(1)])));
    }

    #[test]
    fn merge_never_loses_keys_unless_unsafe() {
        let a = doc(&[("a", Value::Int(1))]);
        let b = doc(&[("b", Value::Int(2))]);
        let merged = merge_all(&[a, b], &OverlapRules::new());
        assert!(merged.get("a").is_some());
        assert!(merged.get("b").is_some());
    }
}
