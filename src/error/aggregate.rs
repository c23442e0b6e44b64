//! Aggregation container for multiple [`ConfigError`] values.

use std::{fmt, sync::Arc};

use super::types::ConfigError;

/// Collection of [`ConfigError`]s produced during a single resolution
/// attempt, for example when every directory in a hierarchical load fails.
#[derive(Debug, Default)]
pub struct AggregatedErrors(Vec<Arc<ConfigError>>);

impl AggregatedErrors {
    /// Creates a new aggregation from a vector of errors.
    #[must_use]
    pub const fn new(errors: Vec<Arc<ConfigError>>) -> Self {
        Self(errors)
    }

    /// Iterates over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter().map(Arc::as_ref)
    }

    /// Number of errors in the aggregation.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the aggregation holds no errors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AggregatedErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}: {e}", i + 1)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedErrors {}
