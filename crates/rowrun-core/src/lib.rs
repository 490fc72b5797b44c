//! rowrun core library
//!
//! Sequential processing runs with ordered progress reporting, the
//! append-only run log, and the confirm-on-sensitive selection dialog.

pub mod domain;
pub mod fakes;
pub mod log_file;
pub mod obs;
pub mod ports;
pub mod run;
pub mod selection;
pub mod telemetry;

pub use domain::{
    ClassifyError, LogEntry, LogEntryParseError, LogStoreError, Result, RunError, RunOutcome,
    RunReport, RunState, RunStatus, SelectionError,
};

pub use log_file::{FileLogStore, LogTail, DEFAULT_LOG_FILE};

pub use obs::{
    emit_classify_failed, emit_log_write_failed, emit_record_processed, emit_run_finished,
    emit_run_rejected, emit_run_started, run_span,
};

pub use ports::{
    ChannelSink, Classifier, FixedCount, FnClassifier, LogStore, NullSink, ProgressSink,
    RandomClassifier, RecordSource, RetryingClassifier, SinkMessage,
};

pub use run::{Processor, RunConfig, RunHandle, DEFAULT_RECORD_DELAY};

pub use selection::{
    AcceptOutcome, DialogState, SelectionDialog, STANDARD_CHOICES, STANDARD_SENSITIVE,
};

pub use telemetry::init_tracing;

/// Crate version, from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
