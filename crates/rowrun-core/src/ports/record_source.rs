//! Record source port.

/// Supplies the records a run iterates over.
///
/// The run only needs to know how many records exist; records are
/// addressed by 1-based position.
pub trait RecordSource {
    fn count(&self) -> u64;
}

/// A source with a fixed number of anonymous records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCount(pub u64);

impl RecordSource for FixedCount {
    fn count(&self) -> u64 {
        self.0
    }
}

impl<T> RecordSource for [T] {
    fn count(&self) -> u64 {
        self.len() as u64
    }
}

impl<T> RecordSource for Vec<T> {
    fn count(&self) -> u64 {
        self.len() as u64
    }
}
