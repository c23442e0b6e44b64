//! Reference [`Parser`] implementations used by tests and simple hosts.
//!
//! These are not the core's concern in production — real deployments plug in
//! their own `js`/`ts` evaluators — but a JSON/YAML implementation is useful
//! enough (and simple enough) to ship for exercising the rest of the system
//! end to end.

use crate::error::ConfigError;
use crate::parser::{ConfigFormat, Parser};
use crate::value::{Document, Value};

#[cfg(feature = "serde_json")]
fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(map) => {
            let mut doc = Document::new();
            for (key, value) in map {
                doc.insert(key, json_to_value(value));
            }
            Value::Document(doc)
        }
    }
}

#[cfg(feature = "yaml")]
fn yaml_to_value(yaml: serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else {
                Value::Float(n.as_f64().unwrap_or_default())
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_value).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut doc = Document::new();
            for (key, value) in map {
                if let serde_yaml::Value::String(key) = key {
                    doc.insert(key, yaml_to_value(value));
                }
            }
            Value::Document(doc)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(tagged.value),
    }
}

/// A [`Parser`] that understands JSON and, with the `yaml` feature, YAML.
///
/// `js`/`ts` formats are rejected with [`ConfigError::OperationFailed`],
/// since evaluating those safely is a host concern the core never takes on.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinParser;

impl Parser for BuiltinParser {
    fn parse(&self, format: ConfigFormat, text: &str) -> Result<Value, ConfigError> {
        match format {
            #[cfg(feature = "serde_json")]
            ConfigFormat::Json => serde_json::from_str::<serde_json::Value>(text)
                .map(json_to_value)
                .map_err(|e| ConfigError::OperationFailed {
                    message: format!("failed to parse JSON: {e}"),
                }),
            #[cfg(not(feature = "serde_json"))]
            ConfigFormat::Json => Err(ConfigError::OperationFailed {
                message: "serde_json feature disabled".into(),
            }),
            #[cfg(feature = "yaml")]
            ConfigFormat::Yaml => serde_yaml::from_str::<serde_yaml::Value>(text)
                .map(yaml_to_value)
                .map_err(|e| ConfigError::OperationFailed {
                    message: format!("failed to parse YAML: {e}"),
                }),
            #[cfg(not(feature = "yaml"))]
            ConfigFormat::Yaml => Err(ConfigError::OperationFailed {
                message: "yaml feature disabled".into(),
            }),
            ConfigFormat::Js | ConfigFormat::Ts => Err(ConfigError::OperationFailed {
                message: "dynamic module formats require a host-supplied parser".into(),
            }),
        }
    }
}

#[cfg(test)]
#[cfg(feature = "serde_json")]
mod tests {
    use super::*;

    #[test]
    fn parses_json_object() {
        let parser = BuiltinParser;
        let value = parser
            .parse(ConfigFormat::Json, r#"{"a": 1, "b": [true, null]}"#)
            .expect("valid json");
        let doc = value.as_document().expect("document");
        assert_eq!(doc.get("a"), Some(&Value::Int(1)));
    }

    #[test]
    #[cfg(feature = "yaml")]
    fn parses_yaml_object() {
        let parser = BuiltinParser;
        let value = parser
            .parse(ConfigFormat::Yaml, "database:\n  host: localhost\n")
            .expect("valid yaml");
        let doc = value.as_document().expect("document");
        assert_eq!(
            doc.get_path("database.host"),
            Some(&Value::String("localhost".into()))
        );
    }
}
