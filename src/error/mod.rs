//! Error taxonomy for the configuration core.

mod aggregate;
mod constructors;
mod types;

pub use aggregate::AggregatedErrors;
pub use types::{ConfigError, ExtraKeysDetail, ValidationDetail};

/// Canonical result type for public APIs in this crate.
///
/// Errors are wrapped in an [`std::sync::Arc`] to keep `Result` small on
/// public signatures while still allowing rich, non-`Copy` error payloads and
/// cheap cloning when an error needs to be threaded through multiple
/// reporting paths (for example, surfaced both to a CLI exit path and to an
/// audit log).
pub type CoreResult<T> = std::result::Result<T, std::sync::Arc<ConfigError>>;

#[cfg(test)]
mod tests;
