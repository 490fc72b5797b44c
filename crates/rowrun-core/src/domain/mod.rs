//! Domain models for rowrun.
//!
//! - `RunOutcome` / `LogEntry`: what happened to one record
//! - `RunState` / `RunStatus`: counters and lifecycle of a run
//! - `RunReport`: summary handed back when a run ends

pub mod error;
pub mod outcome;
pub mod state;

pub use error::{
    ClassifyError, LogEntryParseError, LogStoreError, Result, RunError, SelectionError,
};
pub use outcome::{LogEntry, RunOutcome};
pub use state::{RunReport, RunState, RunStatus};
