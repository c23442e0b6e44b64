//! The parser contract consumed by the per-directory loader.
//!
//! The core never executes configuration text itself; it hands text and a
//! [`ConfigFormat`] to a [`Parser`] implementation and expects a [`Value`]
//! back. A `js`/`ts` parser is expected to sandbox any evaluation itself —
//! the core has no opinion on how that happens.

use crate::error::ConfigError;
use crate::value::Value;

/// The configuration source formats the core is aware of.
///
/// `Js` and `Ts` name dynamic-module formats whose evaluation is entirely
/// the parser's responsibility; the core only ever sees the resulting
/// [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFormat {
    /// YAML text.
    Yaml,
    /// JSON text.
    Json,
    /// A JavaScript module exporting a configuration object.
    Js,
    /// A TypeScript module exporting a configuration object.
    Ts,
}

impl ConfigFormat {
    /// Infers a format from a file extension, case-insensitively.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "js" | "mjs" | "cjs" => Some(Self::Js),
            "ts" | "mts" | "cts" => Some(Self::Ts),
            _ => None,
        }
    }

    /// The canonical extension for this format, used when constructing the
    /// alternate-extension fallback for YAML.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Js => "js",
            Self::Ts => "ts",
        }
    }
}

/// Extension search order used when resolving a bare config file name to a
/// candidate on disk (highest priority first).
pub const EXTENSION_SEARCH_ORDER: [&str; 9] = [
    "ts", "mts", "cts", "js", "mjs", "cjs", "json", "yaml", "yml",
];

/// Parses raw configuration text of a known [`ConfigFormat`] into a
/// [`Value`].
///
/// Implementations are expected to return a [`ConfigError::OperationFailed`]
/// (or a more specific variant) on malformed input; they must never panic on
/// attacker-controlled text.
pub trait Parser: Send + Sync {
    /// Parses `text` according to `format`.
    ///
    /// # Errors
    ///
    /// Returns an error describing why `text` could not be parsed.
    fn parse(&self, format: ConfigFormat, text: &str) -> Result<Value, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_inference_is_case_insensitive() {
        assert_eq!(ConfigFormat::from_extension("YAML"), Some(ConfigFormat::Yaml));
        assert_eq!(ConfigFormat::from_extension("Json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("toml"), None);
    }
}
