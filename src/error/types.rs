//! Primary error enum for the configuration core.

use std::path::PathBuf;

use thiserror::Error;

use super::aggregate::AggregatedErrors;

/// Detail payload for [`ConfigError::ExtraKeys`].
#[derive(Debug, Clone)]
pub struct ExtraKeysDetail {
    /// Dot-paths present in the document but not in the schema's key universe.
    pub offending: Vec<String>,
    /// The full set of dot-paths the schema allows.
    pub allowed: Vec<String>,
}

/// A single field-level validation failure.
#[derive(Debug, Clone)]
pub struct ValidationDetail {
    /// Dot-path of the offending field.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

/// Errors that can occur while discovering, loading, merging, validating, or
/// resolving configuration.
///
/// Every variant corresponds to one taxonomy entry documented for the core:
/// filesystem failures, schema/document mismatches, CLI argument failures,
/// and invocation-resolver arbitration failures.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The merged document did not satisfy the host schema's structural
    /// validator.
    #[error("configuration/validation: {0:?}")]
    Validation(Vec<ValidationDetail>),

    /// The document contains keys outside the schema's key universe.
    #[error("configuration/extra_keys: {} offending key(s)", .0.offending.len())]
    ExtraKeys(ExtraKeysDetail),

    /// The schema itself is internally inconsistent (for example, two
    /// fields claim the same dot-path with incompatible kinds).
    #[error("configuration/schema: {0}")]
    SchemaInvalid(String),

    /// A required path does not exist.
    #[error("filesystem/not_found: {path}")]
    NotFound {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// A path exists but cannot be read.
    #[error("filesystem/not_readable: {path}: {source}")]
    NotReadable {
        /// Path that failed the readability check.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A path could not be written.
    #[error("filesystem/not_writable: {path}: {source}")]
    NotWritable {
        /// Path that failed to write.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A directory or file could not be created.
    #[error("filesystem/creation_failed: {path}: {source}")]
    CreationFailed {
        /// Path that failed to be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A filesystem or parser operation failed for a reason not covered by
    /// the other `filesystem/*` variants (including advisory timeouts).
    #[error("filesystem/operation_failed: {message}")]
    OperationFailed {
        /// Description of the failed operation.
        message: String,
    },

    /// A CLI-supplied argument failed validation.
    #[error("argument/invalid: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// The MCP invocation payload failed schema parsing.
    #[error("mcp/invalid_config: {message}")]
    InvalidMcpConfig {
        /// Description of the parse failure.
        message: String,
    },

    /// Neither a runtime payload nor a working directory was supplied to the
    /// invocation resolver.
    #[error("mcp/missing_context")]
    MissingContext,

    /// File-config resolution was requested but no resolver was wired.
    #[error("mcp/missing_resolver")]
    MissingResolver,

    /// Multiple errors occurred while loading or validating configuration.
    #[error("multiple configuration errors:\n{0}")]
    Aggregate(Box<AggregatedErrors>),
}
