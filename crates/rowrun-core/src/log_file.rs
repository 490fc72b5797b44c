//! File-backed run log and a poller that follows it.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::{LogEntry, LogStoreError};
use crate::ports::LogStore;

/// Default location of the run log, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "execution.log";

/// File-backed log store.
///
/// Layout: one `Record <n>: <OK|Failed>` line per processed record.
///
/// Clones share a truncation counter, so a [`LogTail`] taken from any
/// clone notices every truncate made through the others.
#[derive(Debug, Clone)]
pub struct FileLogStore {
    path: PathBuf,
    generation: Arc<AtomicU64>,
}

impl FileLogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole log as written so far. A missing file reads as empty.
    pub fn read_to_string(&self) -> Result<String, LogStoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    /// Every newline-terminated line. A partially written last line is left out.
    pub fn read_lines(&self) -> Result<Vec<String>, LogStoreError> {
        Ok(complete_lines(&self.read_to_string()?)
            .map(str::to_string)
            .collect())
    }

    /// Start following this log from the beginning.
    pub fn tail(&self) -> LogTail {
        LogTail {
            store: self.clone(),
            generation: self.generation(),
            seen_lines: 0,
            seen_bytes: 0,
        }
    }

    /// Number of truncates made through this store or its clones.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn io_error(&self, source: std::io::Error) -> LogStoreError {
        LogStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LogStore for FileLogStore {
    fn truncate(&self) -> Result<(), LogStoreError> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        self.generation.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn append(&self, entry: &LogEntry) -> Result<(), LogStoreError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(entry.to_line().as_bytes())
            .map_err(|e| self.io_error(e))
    }
}

/// Follows a log file by re-reading it.
///
/// Each poll returns only lines completed since the previous poll. The
/// tail starts over when the store was truncated since the last poll, or
/// when the file got shorter than what was already read (a writer outside
/// this process truncated it).
#[derive(Debug, Clone)]
pub struct LogTail {
    store: FileLogStore,
    generation: u64,
    seen_lines: usize,
    seen_bytes: usize,
}

impl LogTail {
    pub fn poll(&mut self) -> Result<Vec<String>, LogStoreError> {
        // Counter before content: a racing truncate may repeat lines, never drop them.
        let generation = self.store.generation();
        let content = self.store.read_to_string()?;
        let complete_len = content.rfind('\n').map_or(0, |end| end + 1);

        if generation != self.generation || complete_len < self.seen_bytes {
            self.generation = generation;
            self.seen_lines = 0;
            self.seen_bytes = 0;
        }

        let lines: Vec<&str> = complete_lines(&content).collect();
        let start = self.seen_lines.min(lines.len());
        let fresh = lines[start..].iter().map(|l| l.to_string()).collect();
        self.seen_lines = lines.len();
        self.seen_bytes = complete_len;
        Ok(fresh)
    }
}

fn complete_lines(content: &str) -> impl Iterator<Item = &str> {
    let complete = match content.rfind('\n') {
        Some(end) => &content[..end],
        None => "",
    };
    complete
        .split('\n')
        .filter(move |_| !complete.is_empty())
        .map(|line| line.trim_end_matches('\r'))
}
