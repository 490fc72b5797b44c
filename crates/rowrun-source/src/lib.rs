//! rowrun record sources
//!
//! - `xlsx`: first-sheet workbook reader producing a [`Table`]
//! - `table`: cell values, tables and the load-or-keep [`TableSlot`]
//! - `text`: text documents and `{{placeholder}}` segmentation

pub mod error;
pub mod table;
pub mod text;
pub mod xlsx;

pub use error::{Result, SourceReadError};
pub use table::{CellValue, Table, TableSlot, UNKNOWN};
pub use text::{read_text, segments, Segment, SegmentStyle};
pub use xlsx::{address_to_index, read_xlsx};
