use std::path::PathBuf;

use thiserror::Error;

/// Failure to load a table or text document.
///
/// Loading either fully succeeds or returns one of these; nothing is
/// partially applied.
#[derive(Debug, Error)]
pub enum SourceReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not a zip container: {reason}")]
    NotZip { path: PathBuf, reason: String },

    #[error("part '{part}' is missing from the workbook")]
    MissingPart { part: String },

    #[error("failed to read part '{part}': {reason}")]
    PartRead { part: String, reason: String },

    #[error("XML parse error in '{part}': {reason}")]
    Xml { part: String, reason: String },

    #[error("invalid cell address: {0}")]
    InvalidAddress(String),

    #[error("shared string index {0} out of bounds")]
    SharedStringOutOfBounds(usize),

    #[error("the first sheet has no header row")]
    MissingHeader,

    #[error("workbook has no sheets")]
    NoSheets,
}

pub type Result<T> = std::result::Result<T, SourceReadError>;
