//! Domain-level error taxonomy for rowrun.

use std::path::PathBuf;

/// Errors raised when starting or awaiting a processing run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("a processing run is already active")]
    AlreadyRunning,

    #[error("processing task failed: {0}")]
    TaskFailed(String),
}

/// Errors from a log store. The run swallows these; they never abort it.
#[derive(Debug, thiserror::Error)]
pub enum LogStoreError {
    #[error("log file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("log store unavailable: {0}")]
    Unavailable(String),
}

/// A classifier could not decide on an outcome for a record.
///
/// The run counts such a record as `Failed` and moves on.
#[derive(Debug, Clone, thiserror::Error)]
#[error("classification of record {record_index} failed: {reason}")]
pub struct ClassifyError {
    pub record_index: u64,
    pub reason: String,
}

impl ClassifyError {
    pub fn new(record_index: u64, reason: impl Into<String>) -> Self {
        Self {
            record_index,
            reason: reason.into(),
        }
    }
}

/// Errors produced when reading a log line back.
#[derive(Debug, thiserror::Error)]
pub enum LogEntryParseError {
    #[error("malformed log line: {0:?}")]
    Malformed(String),

    #[error("invalid record index: {0:?}")]
    InvalidIndex(String),

    #[error("unknown outcome: {0:?}")]
    UnknownOutcome(String),
}

/// Errors from the selection dialog state machine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("selection dialog needs at least one choice")]
    NoChoices,

    #[error("sensitive choice {0:?} is not one of the available choices")]
    UnknownSensitiveChoice(String),

    #[error("choice {index} is out of range (have {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("a confirmation is pending for {0:?}")]
    ConfirmationPending(String),

    #[error("no confirmation is pending")]
    NotAwaitingConfirmation,

    #[error("a choice has already been committed: {0:?}")]
    AlreadyCommitted(String),
}

/// Result type for run operations.
pub type Result<T> = std::result::Result<T, RunError>;
