//! Auris aggregation engine.
//!
//! Turns raw per-slot sound-event-detection records into:
//! - a fixed 48-slot timeline of deduplicated, counted events, and
//! - a capped, priority-ordered ranking of the day's most relevant events.
//!
//! The engine is pure between its I/O seams: [`pipeline::SlotSource`] and
//! [`pipeline::SummarySink`] are the only collaborators that touch the
//! outside world.

pub mod error;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod ranking;
pub mod state_machine;
pub mod tables;
pub mod timeline;

pub use error::AggregateError;
pub use extract::{classify_shape, extract_labels, PayloadShape};
pub use normalize::{Normalizer, NormalizerTables};
pub use pipeline::{
    NoopObserver, Pipeline, RunFailure, RunObserver, RunOutcome, SlotSource, SummarySink,
};
pub use ranking::{build_ranking, CategoryMap, RankingPolicy};
pub use state_machine::{validate_transition, RunPhase};
pub use timeline::build_timeline;
