//! Loaded tables: header names plus fixed-width rows of cell values.

use std::fmt;

use rowrun_core::RecordSource;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Rendering of cells whose kind is not supported.
pub const UNKNOWN: &str = "UNKNOWN";

/// One cell of a loaded table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Blank, error or otherwise unsupported cell.
    Unknown,
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CellValue::Unknown)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Unknown => f.write_str(UNKNOWN),
        }
    }
}

/// Header names and data rows of one sheet.
///
/// Every row is exactly `headers.len()` cells wide.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Build a table, padding short rows with `Unknown` and cutting long
    /// rows down to the header width.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Unknown);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row at 1-based record position.
    pub fn record(&self, record_index: u64) -> Option<&[CellValue]> {
        let i = usize::try_from(record_index).ok()?.checked_sub(1)?;
        self.rows.get(i).map(Vec::as_slice)
    }
}

impl RecordSource for Table {
    fn count(&self) -> u64 {
        self.rows.len() as u64
    }
}

/// The currently loaded table.
///
/// A new table replaces the old one only when its load succeeds, so a
/// failed load leaves the previous rows in place.
#[derive(Debug, Default)]
pub struct TableSlot {
    current: Option<Table>,
}

impl TableSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Table> {
        self.current.as_ref()
    }

    /// Install the result of a load. On error the slot is left unchanged
    /// and the error is handed back.
    pub fn replace_with(&mut self, loaded: Result<Table>) -> Result<&Table> {
        let table = loaded?;
        Ok(&*self.current.insert(table))
    }

    pub fn clear(&mut self) {
        self.current = None;
    }
}

impl RecordSource for TableSlot {
    fn count(&self) -> u64 {
        self.current.as_ref().map_or(0, RecordSource::count)
    }
}
