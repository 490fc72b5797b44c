//! Per-record outcomes and the log lines that record them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::LogEntryParseError;

/// Classification of a single record after processing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RunOutcome {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Failed")]
    Failed,
}

impl RunOutcome {
    /// Text used in log lines and summaries.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Ok => "OK",
            RunOutcome::Failed => "Failed",
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RunOutcome::Ok)
    }
}

impl From<bool> for RunOutcome {
    fn from(success: bool) -> Self {
        if success {
            RunOutcome::Ok
        } else {
            RunOutcome::Failed
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunOutcome {
    type Err = LogEntryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OK" => Ok(RunOutcome::Ok),
            "Failed" => Ok(RunOutcome::Failed),
            other => Err(LogEntryParseError::UnknownOutcome(other.to_string())),
        }
    }
}

/// One line of the run log: `Record <n>: <OK|Failed>`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogEntry {
    /// 1-based position of the record in the source.
    pub record_index: u64,

    /// Outcome assigned to the record.
    pub outcome: RunOutcome,
}

impl LogEntry {
    pub fn new(record_index: u64, outcome: RunOutcome) -> Self {
        Self {
            record_index,
            outcome,
        }
    }

    /// The entry rendered as a newline-terminated line, ready to append.
    pub fn to_line(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record {}: {}", self.record_index, self.outcome)
    }
}

impl FromStr for LogEntry {
    type Err = LogEntryParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let rest = line
            .strip_prefix("Record ")
            .ok_or_else(|| LogEntryParseError::Malformed(line.to_string()))?;
        let (index, outcome) = rest
            .split_once(": ")
            .ok_or_else(|| LogEntryParseError::Malformed(line.to_string()))?;

        let record_index = index
            .parse::<u64>()
            .map_err(|_| LogEntryParseError::InvalidIndex(index.to_string()))?;
        if record_index == 0 {
            return Err(LogEntryParseError::InvalidIndex(index.to_string()));
        }

        Ok(LogEntry {
            record_index,
            outcome: outcome.parse()?,
        })
    }
}
