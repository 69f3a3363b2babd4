//! Error types for the aggregation engine.

use auris_core::error::AurisError;

use crate::state_machine::RunPhase;

/// Errors from the aggregation pipeline itself.
///
/// The normalizer and extractor never raise; they degrade. The only
/// engine-local failure is a programming error caught by the phase state
/// machine.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("Invalid phase transition: {0} -> {1}")]
    InvalidTransition(RunPhase, RunPhase),
}

impl From<AggregateError> for AurisError {
    fn from(err: AggregateError) -> Self {
        AurisError::Aggregation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_display() {
        let err = AggregateError::InvalidTransition(RunPhase::Completed, RunPhase::Fetching);
        assert_eq!(
            err.to_string(),
            "Invalid phase transition: completed -> fetching"
        );
    }

    #[test]
    fn test_conversion_to_auris_error() {
        let err: AurisError =
            AggregateError::InvalidTransition(RunPhase::Failed, RunPhase::Fetching).into();
        assert!(matches!(err, AurisError::Aggregation(_)));
    }
}
