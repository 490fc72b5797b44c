//! Run state and the report produced when a run ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::outcome::RunOutcome;

/// Lifecycle status of a processing run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunStatus {
    Running,
    Complete,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunStatus::Running)
    }
}

/// Counters for one processing run.
///
/// Observers only ever receive copies. `processed_count` always equals
/// `ok_count + failed_count` because all three move in [`RunState::record`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunState {
    /// Number of records in the run, fixed at start.
    pub total_records: u64,

    /// Records processed so far.
    pub processed_count: u64,

    /// Records classified `OK`.
    pub ok_count: u64,

    /// Records classified `Failed`.
    pub failed_count: u64,

    /// Current lifecycle status.
    pub status: RunStatus,
}

impl RunState {
    /// Fresh state for a run over `total_records` records.
    pub fn new(total_records: u64) -> Self {
        Self {
            total_records,
            processed_count: 0,
            ok_count: 0,
            failed_count: 0,
            status: RunStatus::Running,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Records still waiting to be processed.
    pub fn remaining(&self) -> u64 {
        self.total_records - self.processed_count
    }

    /// Completed fraction in `[0.0, 1.0]`. An empty run counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total_records == 0 {
            1.0
        } else {
            self.processed_count as f64 / self.total_records as f64
        }
    }

    pub(crate) fn record(&mut self, outcome: RunOutcome) {
        debug_assert!(self.processed_count < self.total_records);
        match outcome {
            RunOutcome::Ok => self.ok_count += 1,
            RunOutcome::Failed => self.failed_count += 1,
        }
        self.processed_count += 1;
    }

    pub(crate) fn finish(&mut self, status: RunStatus) {
        debug_assert!(status.is_terminal());
        self.status = status;
    }
}

/// Summary of a finished run, returned by `RunHandle::wait`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunReport {
    /// Unique identifier for the run.
    pub run_id: Uuid,

    /// Final counters and terminal status.
    pub state: RunState,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run reached its terminal state.
    pub finished_at: DateTime<Utc>,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Log store operations that failed and were skipped.
    pub log_failures: u64,
}

impl RunReport {
    pub fn completed(&self) -> bool {
        self.state.status == RunStatus::Complete
    }
}
