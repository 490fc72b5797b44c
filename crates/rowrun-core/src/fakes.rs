//! In-memory fakes for the run ports (testing only)
//!
//! Provides `MemoryLogStore`, `RecordingSink`, and `ScriptedClassifier`
//! that satisfy the port contracts without touching the filesystem or
//! a random source.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{ClassifyError, LogEntry, LogStoreError, RunOutcome, RunState};
use crate::ports::{Classifier, LogStore, ProgressSink, SinkMessage};

// ---------------------------------------------------------------------------
// MemoryLogStore
// ---------------------------------------------------------------------------

/// In-memory log store backed by a `Vec<LogEntry>`.
///
/// Can be told to fail the truncate or specific appends, to exercise the
/// run's "log failure does not stop the run" path.
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    entries: Mutex<Vec<LogEntry>>,
    truncations: AtomicU64,
    fail_truncate: bool,
    fail_appends: HashSet<u64>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `truncate` call fail.
    pub fn failing_truncate(mut self) -> Self {
        self.fail_truncate = true;
        self
    }

    /// Make the append for `record_index` fail.
    pub fn failing_append_at(mut self, record_index: u64) -> Self {
        self.fail_appends.insert(record_index);
        self
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    /// Entries rendered as log lines, without the trailing newline.
    pub fn lines(&self) -> Vec<String> {
        self.entries().iter().map(ToString::to_string).collect()
    }

    pub fn truncations(&self) -> u64 {
        self.truncations.load(Ordering::SeqCst)
    }
}

impl LogStore for MemoryLogStore {
    fn truncate(&self) -> Result<(), LogStoreError> {
        self.truncations.fetch_add(1, Ordering::SeqCst);
        if self.fail_truncate {
            return Err(LogStoreError::Unavailable("truncate disabled".to_string()));
        }
        self.entries.lock().unwrap().clear();
        Ok(())
    }

    fn append(&self, entry: &LogEntry) -> Result<(), LogStoreError> {
        if self.fail_appends.contains(&entry.record_index) {
            return Err(LogStoreError::Unavailable(format!(
                "append disabled for record {}",
                entry.record_index
            )));
        }
        self.entries.lock().unwrap().push(*entry);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Progress sink that remembers every message in arrival order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<SinkMessage>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<SinkMessage> {
        self.messages.lock().unwrap().clone()
    }

    pub fn updates(&self) -> Vec<RunState> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                SinkMessage::Update(state) => Some(state),
                SinkMessage::Complete(_) => None,
            })
            .collect()
    }

    pub fn completions(&self) -> Vec<RunState> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                SinkMessage::Complete(state) => Some(state),
                SinkMessage::Update(_) => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn on_update(&self, state: RunState) {
        self.messages.lock().unwrap().push(SinkMessage::Update(state));
    }

    fn on_complete(&self, state: RunState) {
        self.messages
            .lock()
            .unwrap()
            .push(SinkMessage::Complete(state));
    }
}

// ---------------------------------------------------------------------------
// ScriptedClassifier
// ---------------------------------------------------------------------------

/// Classifier that replays a fixed script of answers.
///
/// Once the script runs out every call returns a `ClassifyError`.
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    script: Mutex<VecDeque<Result<RunOutcome, String>>>,
    calls: AtomicU64,
}

impl ScriptedClassifier {
    pub fn new(outcomes: Vec<RunOutcome>) -> Self {
        Self::from_results(outcomes.into_iter().map(Ok).collect())
    }

    /// Script that may include errors, given as their reason.
    pub fn from_results(results: Vec<Result<RunOutcome, String>>) -> Self {
        Self {
            script: Mutex::new(results.into()),
            calls: AtomicU64::new(0),
        }
    }

    /// Number of `classify` calls so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, record_index: u64) -> Result<RunOutcome, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(outcome)) => Ok(outcome),
            Some(Err(reason)) => Err(ClassifyError::new(record_index, reason)),
            None => Err(ClassifyError::new(record_index, "script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_log_store_truncate_and_append() {
        let store = MemoryLogStore::new();
        store.append(&LogEntry::new(1, RunOutcome::Ok)).unwrap();
        store.truncate().unwrap();
        store.append(&LogEntry::new(1, RunOutcome::Failed)).unwrap();
        assert_eq!(store.lines(), vec!["Record 1: Failed"]);
        assert_eq!(store.truncations(), 1);
    }

    #[test]
    fn test_memory_log_store_injected_failures() {
        let store = MemoryLogStore::new().failing_truncate().failing_append_at(2);
        assert!(store.truncate().is_err());
        assert!(store.append(&LogEntry::new(1, RunOutcome::Ok)).is_ok());
        assert!(store.append(&LogEntry::new(2, RunOutcome::Ok)).is_err());
        assert_eq!(store.entries().len(), 1);
    }

    #[tokio::test]
    async fn test_scripted_classifier_replays_then_errors() {
        let classifier = ScriptedClassifier::from_results(vec![
            Ok(RunOutcome::Ok),
            Err("backend down".to_string()),
        ]);
        assert_eq!(classifier.classify(1).await.unwrap(), RunOutcome::Ok);
        let err = classifier.classify(2).await.unwrap_err();
        assert_eq!(err.record_index, 2);
        assert!(classifier.classify(3).await.is_err());
        assert_eq!(classifier.calls(), 3);
    }
}
