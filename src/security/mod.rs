//! Security validator: field-level rules, cross-source override detection,
//! and the bounded audit log.

mod audit;

pub use audit::{
    AuditLog, EVENT_BUFFER_CAPACITY, EventSource, Severity, SecurityEvent, global_audit_log,
};

use std::path::Path;

use chrono::Utc;
use uuid::Uuid;

use crate::value::{Document, Value};

/// Which deployment posture a [`SecurityValidator`] enforces.
///
/// `Development` favours ergonomics (tilde and `$VAR` expansion markers are
/// allowed through with a warning); `Production` rejects them outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Permissive: suspicious values are logged but not rejected.
    Development,
    /// Strict: suspicious values are rejected outright.
    Production,
}

/// Maximum permitted length, in characters, for a [`FieldRule::Path`] value.
pub const PATH_MAX_LEN: usize = 1000;

/// A single field-level security rule, applied to one dot-path.
#[derive(Debug, Clone)]
pub enum FieldRule {
    /// The field's string value must be a well-formed path: no embedded NUL
    /// bytes, no more than [`PATH_MAX_LEN`] characters, no `..` traversal
    /// segments, and (in `Production`) no `~` or `$VAR`/`${VAR}` expansion
    /// markers.
    Path {
        /// When `true`, an absolute path is rejected outright.
        relative_only: bool,
    },
    /// The field's numeric value must be finite and within `[min, max]`.
    Number {
        /// Inclusive lower bound.
        min: f64,
        /// Inclusive upper bound.
        max: f64,
    },
    /// The field's string value must be no longer than `max_len` and, if
    /// `pattern` is set, must match it.
    StringRule {
        /// Maximum permitted length in characters.
        max_len: usize,
        /// Optional pattern the value must match.
        pattern: Option<regex::Regex>,
    },
}

/// Maps dot-paths to the [`FieldRule`] that governs them.
#[derive(Debug, Clone, Default)]
pub struct FieldRules(Vec<(String, FieldRule)>);

impl FieldRules {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Registers `rule` for `path`.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, rule: FieldRule) -> Self {
        self.0.push((path.into(), rule));
        self
    }

    fn rule_for<'a>(&'a self, path: &str) -> Option<&'a FieldRule> {
        self.0
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, rule)| rule)
    }
}

/// Enforces [`FieldRules`] against a merged document, recording every
/// violation (and every value it passes) to an [`AuditLog`].
pub struct SecurityValidator<'a> {
    profile: Profile,
    rules: FieldRules,
    audit_log: &'a AuditLog,
}

impl<'a> SecurityValidator<'a> {
    /// Creates a validator for `profile`, checking `rules` and recording
    /// events to `audit_log`.
    #[must_use]
    pub fn new(profile: Profile, rules: FieldRules, audit_log: &'a AuditLog) -> Self {
        Self {
            profile,
            rules,
            audit_log,
        }
    }

    /// Walks every leaf of `document` that has a registered rule and
    /// validates it, returning the dot-paths that were rejected.
    ///
    /// A correlation id ties every event produced by a single call together
    /// so an operator can find the full set of violations for one
    /// resolution attempt in the audit log.
    #[must_use]
    pub fn validate(&self, document: &Document, source: EventSource) -> Vec<String> {
        let correlation_id = Uuid::new_v4();
        let mut rejected = Vec::new();
        for path in document.flatten_paths() {
            let Some(rule) = self.rules.rule_for(&path) else {
                continue;
            };
            let Some(value) = document.get_path(&path) else {
                continue;
            };
            if let Err(detail) = check_rule(rule, value, self.profile) {
                self.audit_log.record(SecurityEvent {
                    event_type: detail.event_type.to_string(),
                    severity: detail.severity,
                    source,
                    field: Some(path.clone()),
                    error_code: Some(detail.error_code.to_string()),
                    details: detail.message,
                    correlation_id: Some(correlation_id),
                    timestamp: Utc::now(),
                });
                rejected.push(path);
            }
        }
        rejected
    }

    /// Compares a CLI-sourced document against a filesystem-sourced one and
    /// records an informational [`SecurityEvent`] for every key present in
    /// both, since a CLI override silently shadowing a file-configured value
    /// is a frequent source of operator confusion.
    pub fn record_cross_source_overrides(&self, cli: &Document, file_config: &Document) {
        let correlation_id = Uuid::new_v4();
        for path in cli.flatten_paths() {
            if file_config.get_path(&path).is_some() {
                self.audit_log.record(SecurityEvent {
                    event_type: "cross_source_override".to_string(),
                    severity: Severity::Info,
                    source: EventSource::Cli,
                    field: Some(path.clone()),
                    error_code: None,
                    details: format!("CLI argument overrides file-configured value at {path}"),
                    correlation_id: Some(correlation_id),
                    timestamp: Utc::now(),
                });
            }
        }
    }
}

struct RuleViolation {
    event_type: &'static str,
    error_code: &'static str,
    severity: Severity,
    message: String,
}

fn check_rule(rule: &FieldRule, value: &Value, profile: Profile) -> Result<(), RuleViolation> {
    match rule {
        FieldRule::Path { relative_only } => check_path_rule(value, profile, *relative_only),
        FieldRule::Number { min, max } => check_number_rule(value, *min, *max),
        FieldRule::StringRule { max_len, pattern } => {
            check_string_rule(value, *max_len, pattern.as_ref())
        }
    }
}

fn check_path_rule(value: &Value, profile: Profile, relative_only: bool) -> Result<(), RuleViolation> {
    let Some(s) = value.as_str() else {
        return Ok(());
    };
    if s.contains('\0') {
        return Err(RuleViolation {
            event_type: "null_byte_in_path",
            error_code: "SEC_NULL_BYTE",
            severity: Severity::Critical,
            message: "path field contains an embedded NUL byte".to_string(),
        });
    }
    if s.chars().count() > PATH_MAX_LEN {
        return Err(RuleViolation {
            event_type: "path_too_long",
            error_code: "SEC_PATH_LENGTH",
            severity: Severity::Error,
            message: format!("path field exceeds the maximum length of {PATH_MAX_LEN} characters"),
        });
    }
    if relative_only && Path::new(s).is_absolute() {
        return Err(RuleViolation {
            event_type: "absolute_path_rejected",
            error_code: "SEC_PATH_ABSOLUTE",
            severity: Severity::Error,
            message: format!("path field must be relative but is absolute: {s}"),
        });
    }
    if Path::new(s).components().any(|c| {
        matches!(c, std::path::Component::ParentDir)
    }) {
        return Err(RuleViolation {
            event_type: "path_traversal",
            error_code: "SEC_PATH_TRAVERSAL",
            severity: Severity::Error,
            message: format!("path field contains a parent-directory traversal segment: {s}"),
        });
    }
    let has_expansion_marker = s.starts_with('~') || s.contains('$');
    if has_expansion_marker {
        if profile == Profile::Production {
            return Err(RuleViolation {
                event_type: "unexpanded_path_marker",
                error_code: "SEC_UNEXPANDED_MARKER",
                severity: Severity::Error,
                message: format!("path field contains an unexpanded marker in production: {s}"),
            });
        }
        return Err(RuleViolation {
            event_type: "unexpanded_path_marker",
            error_code: "SEC_UNEXPANDED_MARKER",
            severity: Severity::Warning,
            message: format!("path field contains an unexpanded marker: {s}"),
        });
    }
    Ok(())
}

fn check_number_rule(value: &Value, min: f64, max: f64) -> Result<(), RuleViolation> {
    let Some(n) = value.as_f64() else {
        return Ok(());
    };
    if !n.is_finite() {
        return Err(RuleViolation {
            event_type: "non_finite_number",
            error_code: "SEC_NON_FINITE",
            severity: Severity::Error,
            message: "numeric field is NaN or infinite".to_string(),
        });
    }
    if n < min || n > max {
        return Err(RuleViolation {
            event_type: "number_out_of_bounds",
            error_code: "SEC_NUMBER_BOUNDS",
            severity: Severity::Error,
            message: format!("numeric field {n} is outside the allowed range [{min}, {max}]"),
        });
    }
    Ok(())
}

fn check_string_rule(
    value: &Value,
    max_len: usize,
    pattern: Option<&regex::Regex>,
) -> Result<(), RuleViolation> {
    let Some(s) = value.as_str() else {
        return Ok(());
    };
    if s.chars().count() > max_len {
        return Err(RuleViolation {
            event_type: "string_too_long",
            error_code: "SEC_STRING_LENGTH",
            severity: Severity::Error,
            message: format!("string field exceeds the maximum length of {max_len}"),
        });
    }
    if let Some(pattern) = pattern {
        if !pattern.is_match(s) {
            return Err(RuleViolation {
                event_type: "string_pattern_mismatch",
                error_code: "SEC_STRING_PATTERN",
                severity: Severity::Error,
                message: format!("string field does not match the required pattern: {s}"),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with(path: &str, value: Value) -> Document {
        let mut doc = Document::new();
        doc.set_path(path, value);
        doc
    }

    #[test]
    fn rejects_null_byte_in_path_field() {
        let log = AuditLog::new(Severity::Info, true);
        let rules = FieldRules::new().with("outDir", FieldRule::Path { relative_only: false });
        let validator = SecurityValidator::new(Profile::Development, rules, &log);
        let doc = doc_with("outDir", Value::String("build\0evil".into()));
        let rejected = validator.validate(&doc, EventSource::Config);
        assert_eq!(rejected, vec!["outDir".to_string()]);
    }

    #[test]
    fn rejects_parent_traversal_in_path_field() {
        let log = AuditLog::new(Severity::Info, true);
        let rules = FieldRules::new().with("outDir", FieldRule::Path { relative_only: false });
        let validator = SecurityValidator::new(Profile::Development, rules, &log);
        let doc = doc_with("outDir", Value::String("../../etc".into()));
        let rejected = validator.validate(&doc, EventSource::Config);
        assert_eq!(rejected, vec!["outDir".to_string()]);
    }

    #[test]
    fn rejects_path_field_over_max_length() {
        let log = AuditLog::new(Severity::Info, true);
        let rules = FieldRules::new().with("outDir", FieldRule::Path { relative_only: false });
        let validator = SecurityValidator::new(Profile::Development, rules, &log);
        let doc = doc_with("outDir", Value::String("a".repeat(PATH_MAX_LEN + 1)));
        let rejected = validator.validate(&doc, EventSource::Config);
        assert_eq!(rejected, vec!["outDir".to_string()]);
    }

    #[test]
    fn rejects_absolute_path_when_relative_only() {
        let log = AuditLog::new(Severity::Info, true);
        let rules = FieldRules::new().with("outDir", FieldRule::Path { relative_only: true });
        let validator = SecurityValidator::new(Profile::Development, rules, &log);

        let absolute = doc_with("outDir", Value::String("/etc/passwd".into()));
        assert_eq!(
            validator.validate(&absolute, EventSource::Config),
            vec!["outDir".to_string()]
        );

        let relative = doc_with("outDir", Value::String("build/out".into()));
        assert!(validator.validate(&relative, EventSource::Config).is_empty());
    }

    #[test]
    fn expansion_marker_is_warning_in_development_but_error_in_production() {
        let dev_log = AuditLog::new(Severity::Info, true);
        let dev_rules = FieldRules::new().with("outDir", FieldRule::Path { relative_only: false });
        let dev_validator = SecurityValidator::new(Profile::Development, dev_rules, &dev_log);
        let doc = doc_with("outDir", Value::String("~/build".into()));
        let rejected = dev_validator.validate(&doc, EventSource::Config);
        assert_eq!(rejected, vec!["outDir".to_string()]);
        assert_eq!(dev_log.snapshot()[0].severity, Severity::Warning);

        let prod_log = AuditLog::new(Severity::Info, true);
        let prod_rules = FieldRules::new().with("outDir", FieldRule::Path { relative_only: false });
        let prod_validator = SecurityValidator::new(Profile::Production, prod_rules, &prod_log);
        let rejected = prod_validator.validate(&doc, EventSource::Config);
        assert_eq!(rejected, vec!["outDir".to_string()]);
        assert_eq!(prod_log.snapshot()[0].severity, Severity::Error);
    }

    #[test]
    fn number_rule_rejects_nan_and_out_of_range() {
        let log = AuditLog::new(Severity::Info, true);
        let rules = FieldRules::new().with(
            "port",
            FieldRule::Number {
                min: 1.0,
                max: 65535.0,
            },
        );
        let validator = SecurityValidator::new(Profile::Development, rules, &log);

        let nan_doc = doc_with("port", Value::Float(f64::NAN));
        assert_eq!(
            validator.validate(&nan_doc, EventSource::Config),
            vec!["port".to_string()]
        );

        let oob_doc = doc_with("port", Value::Int(99999));
        assert_eq!(
            validator.validate(&oob_doc, EventSource::Config),
            vec!["port".to_string()]
        );
    }

    #[test]
    fn string_rule_enforces_length_and_pattern() {
        let log = AuditLog::new(Severity::Info, true);
        let rules = FieldRules::new().with(
            "name",
            FieldRule::StringRule {
                max_len: 5,
                pattern: regex::Regex::new("^[a-z]+$").ok(),
            },
        );
        let validator = SecurityValidator::new(Profile::Development, rules, &log);

        let too_long = doc_with("name", Value::String("abcdefgh".into()));
        assert_eq!(
            validator.validate(&too_long, EventSource::Config),
            vec!["name".to_string()]
        );

        let bad_pattern = doc_with("name", Value::String("AB".into()));
        assert_eq!(
            validator.validate(&bad_pattern, EventSource::Config),
            vec!["name".to_string()]
        );

        let ok = doc_with("name", Value::String("ok".into()));
        assert!(validator.validate(&ok, EventSource::Config).is_empty());
    }

    #[test]
    fn cross_source_override_is_recorded_as_info() {
        let log = AuditLog::new(Severity::Info, true);
        let rules = FieldRules::new();
        let validator = SecurityValidator::new(Profile::Development, rules, &log);

        let cli = doc_with("port", Value::Int(9000));
        let file_config = doc_with("port", Value::Int(8080));
        validator.record_cross_source_overrides(&cli, &file_config);

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].event_type, "cross_source_override");
        assert_eq!(snapshot[0].severity, Severity::Info);
        assert_eq!(snapshot[0].source, EventSource::Cli);
    }
}
