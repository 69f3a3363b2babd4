//! Run phase state machine with validated transitions.
//!
//! Enforces the allowed phase transitions for an aggregation run:
//! NotStarted -> Fetching -> Aggregating -> Persisting -> Completed/Failed

use std::fmt;

use crate::error::AggregateError;

/// Lifecycle phase of one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    Fetching,
    Aggregating,
    Persisting,
    Completed,
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::NotStarted => "not_started",
            RunPhase::Fetching => "fetching",
            RunPhase::Aggregating => "aggregating",
            RunPhase::Persisting => "persisting",
            RunPhase::Completed => "completed",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Validate that a phase transition is allowed.
///
/// Valid transitions:
/// - NotStarted -> Fetching
/// - Fetching -> Aggregating
/// - Fetching -> Failed (no data, or fetch I/O error)
/// - Aggregating -> Persisting
/// - Aggregating -> Failed
/// - Persisting -> Completed
/// - Persisting -> Failed (save error; result retained for retry)
pub fn validate_transition(from: RunPhase, to: RunPhase) -> Result<(), AggregateError> {
    let valid = matches!(
        (from, to),
        (RunPhase::NotStarted, RunPhase::Fetching)
            | (RunPhase::Fetching, RunPhase::Aggregating)
            | (RunPhase::Fetching, RunPhase::Failed)
            | (RunPhase::Aggregating, RunPhase::Persisting)
            | (RunPhase::Aggregating, RunPhase::Failed)
            | (RunPhase::Persisting, RunPhase::Completed)
            | (RunPhase::Persisting, RunPhase::Failed)
    );

    if valid {
        Ok(())
    } else {
        Err(AggregateError::InvalidTransition(from, to))
    }
}
