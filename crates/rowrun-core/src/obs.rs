//! Structured observability hooks for the processing run lifecycle.
//!
//! This module provides:
//! - A run-scoped tracing span via `run_span`
//! - Emission functions for lifecycle events: start, record, log failure, finish
//!
//! Events are emitted at `info!` level unless noted (filter with `RUST_LOG`).

use tracing::{debug, info, warn};

use crate::domain::{RunOutcome, RunState};

/// Span a run's task is instrumented with; every event inside carries the run id.
pub fn run_span(run_id: &str, total_records: u64) -> tracing::Span {
    tracing::info_span!("rowrun.run", run_id = %run_id, total_records = total_records)
}

/// Emit event: run started.
pub fn emit_run_started(run_id: &str, total_records: u64) {
    info!(event = "run.started", run_id = %run_id, total_records = total_records);
}

/// Emit event: a second start was rejected while a run was active.
pub fn emit_run_rejected() {
    warn!(event = "run.rejected", reason = "already_running");
}

/// Emit event: one record processed (debug level).
pub fn emit_record_processed(run_id: &str, record_index: u64, outcome: RunOutcome) {
    debug!(
        event = "run.record_processed",
        run_id = %run_id,
        record = record_index,
        outcome = %outcome,
    );
}

/// Emit event: classifier error, record counted as failed (warning level).
pub fn emit_classify_failed(run_id: &str, record_index: u64, error: &dyn std::fmt::Display) {
    warn!(
        event = "run.classify_failed",
        run_id = %run_id,
        record = record_index,
        error = %error,
    );
}

/// Emit event: log store operation failed and was skipped (warning level).
pub fn emit_log_write_failed(run_id: &str, operation: &str, error: &dyn std::fmt::Display) {
    warn!(
        event = "run.log_write_failed",
        run_id = %run_id,
        operation = operation,
        error = %error,
    );
}

/// Emit event: run reached its terminal state.
pub fn emit_run_finished(run_id: &str, state: &RunState, duration_ms: u64) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        status = ?state.status,
        processed = state.processed_count,
        ok = state.ok_count,
        failed = state.failed_count,
        duration_ms = duration_ms,
    );
}
