//! Aggregation run orchestration.
//!
//! Sequences fetch -> aggregate -> persist for one `(device_id, date)` key
//! and reports a terminal outcome with a machine-checkable reason. The
//! pipeline is stateless between invocations; concurrent runs for different
//! keys share only the read-only normalization tables.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use auris_core::config::AggregationConfig;
use auris_core::error::AurisError;
use auris_core::types::{AggregationResult, FailureReason, TimeSlot};

use crate::normalize::Normalizer;
use crate::ranking::{build_ranking, CategoryMap, RankingPolicy};
use crate::state_machine::{validate_transition, RunPhase};
use crate::timeline::build_timeline;

/// Source of raw per-slot payloads for one day.
///
/// Implementations must return an empty map (not an error) when no rows
/// exist for the key, and must return only slots that have data.
#[async_trait]
pub trait SlotSource: Send + Sync {
    async fn fetch(
        &self,
        device_id: &str,
        date: NaiveDate,
    ) -> Result<BTreeMap<TimeSlot, Value>, AurisError>;
}

/// Destination for a finished aggregation result.
///
/// `upsert` is keyed by `(device_id, date)` and must be idempotent under
/// repeated identical calls. Same-key races resolve last-write-wins in the
/// storage layer; the pipeline adds no coordination.
#[async_trait]
pub trait SummarySink: Send + Sync {
    async fn upsert(
        &self,
        device_id: &str,
        date: NaiveDate,
        result: &AggregationResult,
    ) -> Result<(), AurisError>;
}

/// Hook for observing phase transitions of a run, e.g. to report progress.
pub trait RunObserver: Send + Sync {
    fn on_phase(&self, _phase: RunPhase) {}
}

/// Observer that ignores every transition.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Terminal failure of a run.
#[derive(Debug, Clone)]
pub struct RunFailure {
    pub reason: FailureReason,
    pub message: String,
    /// Present on `SaveError`: the caller may retry persistence without
    /// re-fetching or re-aggregating.
    pub result: Option<AggregationResult>,
}

/// Terminal state of a run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(AggregationResult),
    Failed(RunFailure),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }

    fn failed(reason: FailureReason, message: impl Into<String>) -> Self {
        RunOutcome::Failed(RunFailure {
            reason,
            message: message.into(),
            result: None,
        })
    }
}

/// The aggregation pipeline for one configured deployment.
pub struct Pipeline {
    source: Arc<dyn SlotSource>,
    sink: Arc<dyn SummarySink>,
    normalizer: Normalizer,
    policy: RankingPolicy,
    categories: CategoryMap,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn SlotSource>,
        sink: Arc<dyn SummarySink>,
        config: &AggregationConfig,
    ) -> Self {
        Self {
            source,
            sink,
            normalizer: Normalizer::from_config(config),
            policy: RankingPolicy::from_config(config),
            categories: CategoryMap::from_config(config),
        }
    }

    /// Reduce fetched slot payloads to the timeline plus ranking.
    ///
    /// Pure: no I/O, no suspension points, cannot fail.
    pub fn aggregate(&self, slot_data: &BTreeMap<TimeSlot, Value>) -> AggregationResult {
        let time_blocks = build_timeline(slot_data, &self.normalizer);
        let summary_ranking = build_ranking(&time_blocks, &self.policy, &self.categories);
        AggregationResult {
            time_blocks,
            summary_ranking,
        }
    }

    /// Execute one run without progress reporting.
    pub async fn run(&self, device_id: &str, date: NaiveDate) -> RunOutcome {
        self.run_observed(device_id, date, &NoopObserver).await
    }

    /// Execute one run, reporting each phase transition to `observer`.
    pub async fn run_observed(
        &self,
        device_id: &str,
        date: NaiveDate,
        observer: &dyn RunObserver,
    ) -> RunOutcome {
        let mut phase = RunPhase::NotStarted;
        if let Err(e) = advance(&mut phase, RunPhase::Fetching, observer) {
            return RunOutcome::failed(FailureReason::Unexpected, e.to_string());
        }
        info!(device_id, %date, "aggregation run started");

        let slot_data = match self.source.fetch(device_id, date).await {
            Ok(data) => data,
            Err(e) => {
                warn!(device_id, %date, error = %e, "slot fetch failed");
                let _ = advance(&mut phase, RunPhase::Failed, observer);
                return RunOutcome::failed(
                    FailureReason::Unexpected,
                    format!("fetch failed: {}", e),
                );
            }
        };

        if slot_data.is_empty() {
            // Expected for dates with no detector output; distinct from a
            // transport or storage error.
            info!(device_id, %date, "no slot data for date");
            let _ = advance(&mut phase, RunPhase::Failed, observer);
            return RunOutcome::failed(
                FailureReason::NoData,
                format!("no data recorded for {}", date),
            );
        }

        if let Err(e) = advance(&mut phase, RunPhase::Aggregating, observer) {
            return RunOutcome::failed(FailureReason::Unexpected, e.to_string());
        }
        let result = self.aggregate(&slot_data);
        info!(
            device_id,
            %date,
            total_events = result.total_events(),
            active_slots = result.active_slot_count(),
            ranking_entries = result.summary_ranking.len(),
            "aggregation finished"
        );

        if let Err(e) = advance(&mut phase, RunPhase::Persisting, observer) {
            return RunOutcome::failed(FailureReason::Unexpected, e.to_string());
        }
        match self.sink.upsert(device_id, date, &result).await {
            Ok(()) => {
                let _ = advance(&mut phase, RunPhase::Completed, observer);
                info!(device_id, %date, "aggregation result persisted");
                RunOutcome::Completed(result)
            }
            Err(e) => {
                warn!(device_id, %date, error = %e, "persist failed; result retained");
                let _ = advance(&mut phase, RunPhase::Failed, observer);
                RunOutcome::Failed(RunFailure {
                    reason: FailureReason::SaveError,
                    message: format!("failed to save result: {}", e),
                    result: Some(result),
                })
            }
        }
    }
}

fn advance(
    phase: &mut RunPhase,
    to: RunPhase,
    observer: &dyn RunObserver,
) -> Result<(), crate::error::AggregateError> {
    validate_transition(*phase, to)?;
    *phase = to;
    observer.on_phase(to);
    Ok(())
}
