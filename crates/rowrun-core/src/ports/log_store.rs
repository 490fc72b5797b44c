//! Log store port: the append-only destination for run entries.

use crate::domain::{LogEntry, LogStoreError};

/// Append-only destination for per-record entries.
///
/// Truncated once at the start of every run. Either operation may fail
/// independently; the run logs the failure and carries on.
pub trait LogStore: Send + Sync {
    /// Drop everything written by the previous run.
    fn truncate(&self) -> Result<(), LogStoreError>;

    /// Append one entry as a single line.
    fn append(&self, entry: &LogEntry) -> Result<(), LogStoreError>;
}
