//! Constructors and aggregation helpers for [`ConfigError`].

use std::sync::Arc;

use super::{AggregatedErrors, ConfigError};

impl ConfigError {
    /// Builds a [`ConfigError`] from an iterator of errors.
    ///
    /// Returns `None` if `errors` is empty, the inner error when exactly one
    /// is supplied, and [`ConfigError::Aggregate`] otherwise.
    #[must_use]
    pub fn try_aggregate<I, E>(errors: I) -> Option<Self>
    where
        I: IntoIterator<Item = E>,
        E: Into<Arc<Self>>,
    {
        let mut arcs: Vec<Arc<Self>> = errors.into_iter().map(Into::into).collect();
        if arcs.is_empty() {
            return None;
        }
        Some(if arcs.len() == 1 {
            let last = arcs.pop()?;
            match Arc::try_unwrap(last) {
                Ok(err) => err,
                Err(shared) => Self::Aggregate(Box::new(AggregatedErrors::new(vec![shared]))),
            }
        } else {
            Self::Aggregate(Box::new(AggregatedErrors::new(arcs)))
        })
    }
}

impl From<ConfigError> for Arc<ConfigError> {
    fn from(value: ConfigError) -> Self {
        Arc::new(value)
    }
}
