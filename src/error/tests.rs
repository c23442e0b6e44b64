use std::sync::Arc;

use super::*;

#[test]
fn try_aggregate_empty_is_none() {
    let errors: Vec<Arc<ConfigError>> = Vec::new();
    assert!(ConfigError::try_aggregate(errors).is_none());
}

#[test]
fn try_aggregate_single_unwraps() {
    let err = ConfigError::MissingContext;
    let aggregated = ConfigError::try_aggregate(vec![err]).expect("one error");
    assert!(matches!(aggregated, ConfigError::MissingContext));
}

#[test]
fn try_aggregate_multiple_wraps() {
    let errors = vec![ConfigError::MissingContext, ConfigError::MissingResolver];
    let aggregated = ConfigError::try_aggregate(errors).expect("two errors");
    match aggregated {
        ConfigError::Aggregate(agg) => assert_eq!(agg.len(), 2),
        other => panic!("expected aggregate, got {other:?}"),
    }
}
