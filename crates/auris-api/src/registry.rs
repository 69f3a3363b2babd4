//! Run lifecycle registry.
//!
//! Tracks every analysis run started through the API: status, progress,
//! and terminal result or error. Poll-based; records survive until
//! explicitly deleted.

use std::fmt;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use auris_aggregate::{RunObserver, RunPhase};

/// Externally visible status of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Started,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    fn can_transition(self, to: RunStatus) -> bool {
        matches!(
            (self, to),
            (RunStatus::Started, RunStatus::Running)
                | (RunStatus::Started, RunStatus::Failed)
                | (RunStatus::Running, RunStatus::Running)
                | (RunStatus::Running, RunStatus::Completed)
                | (RunStatus::Running, RunStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Started => "started",
            RunStatus::Running => "running",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One tracked analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub task_id: Uuid,
    pub device_id: String,
    pub date: String,
    pub status: RunStatus,
    pub message: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// In-memory registry of runs, newest first in listings.
#[derive(Default)]
pub struct RunRegistry {
    runs: Mutex<Vec<RunRecord>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new run in `Started` state and return its record.
    pub fn create(&self, device_id: &str, date: &str) -> RunRecord {
        let record = RunRecord {
            task_id: Uuid::new_v4(),
            device_id: device_id.to_string(),
            date: date.to_string(),
            status: RunStatus::Started,
            message: "analysis task accepted".to_string(),
            progress: 0,
            result: None,
            error: None,
            created_at: Utc::now(),
        };
        if let Ok(mut runs) = self.runs.lock() {
            runs.push(record.clone());
        }
        record
    }

    pub fn get(&self, task_id: Uuid) -> Option<RunRecord> {
        let runs = self.runs.lock().ok()?;
        runs.iter().find(|r| r.task_id == task_id).cloned()
    }

    /// All runs, newest first.
    pub fn list(&self) -> Vec<RunRecord> {
        let mut runs = match self.runs.lock() {
            Ok(runs) => runs.clone(),
            Err(_) => return vec![],
        };
        runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        runs
    }

    /// Remove a terminal run. Returns false when the id is unknown.
    ///
    /// Runs still in flight cannot be removed; the caller must surface a
    /// conflict instead.
    pub fn delete(&self, task_id: Uuid) -> Result<bool, RunStatus> {
        let Ok(mut runs) = self.runs.lock() else {
            return Ok(false);
        };
        let Some(pos) = runs.iter().position(|r| r.task_id == task_id) else {
            return Ok(false);
        };
        if !runs[pos].status.is_terminal() {
            return Err(runs[pos].status);
        }
        runs.remove(pos);
        Ok(true)
    }

    /// Move a run forward, ignoring updates that would go backwards (a
    /// terminal state never becomes non-terminal).
    pub fn update(
        &self,
        task_id: Uuid,
        status: RunStatus,
        message: impl Into<String>,
        progress: u8,
    ) {
        self.with_record(task_id, |record| {
            if record.status.can_transition(status) {
                record.status = status;
                record.message = message.into();
                record.progress = progress;
            }
        });
    }

    /// Mark a run completed with its result payload.
    pub fn complete(&self, task_id: Uuid, result: serde_json::Value) {
        self.with_record(task_id, |record| {
            if record.status.can_transition(RunStatus::Completed) {
                record.status = RunStatus::Completed;
                record.message = "analysis completed".to_string();
                record.progress = 100;
                record.result = Some(result);
            }
        });
    }

    /// Mark a run failed with a reason code and message.
    pub fn fail(&self, task_id: Uuid, reason: &str, message: impl Into<String>) {
        self.with_record(task_id, |record| {
            if record.status.can_transition(RunStatus::Failed) {
                record.status = RunStatus::Failed;
                record.message = message.into();
                record.progress = 100;
                record.error = Some(reason.to_string());
            }
        });
    }

    fn with_record<F: FnOnce(&mut RunRecord)>(&self, task_id: Uuid, f: F) {
        if let Ok(mut runs) = self.runs.lock() {
            if let Some(record) = runs.iter_mut().find(|r| r.task_id == task_id) {
                f(record);
            }
        }
    }
}

/// Bridges pipeline phase transitions into registry progress updates.
pub struct ProgressReporter {
    registry: std::sync::Arc<RunRegistry>,
    task_id: Uuid,
}

impl ProgressReporter {
    pub fn new(registry: std::sync::Arc<RunRegistry>, task_id: Uuid) -> Self {
        Self { registry, task_id }
    }
}

impl RunObserver for ProgressReporter {
    fn on_phase(&self, phase: RunPhase) {
        let (message, progress) = match phase {
            RunPhase::Fetching => ("fetching slot data", 25),
            RunPhase::Aggregating => ("aggregating", 50),
            RunPhase::Persisting => ("persisting result", 75),
            // Terminal states carry a result or error and are recorded by
            // the spawning task, not the observer.
            _ => return,
        };
        self.registry
            .update(self.task_id, RunStatus::Running, message, progress);
    }
}
