//! Processing runs: one sequential pass over a record source.
//!
//! A [`Processor`] owns a single run slot. [`Processor::start`] claims the
//! slot synchronously, spawns the run on the tokio runtime and hands back a
//! [`RunHandle`]. Per record the run waits the configured delay, asks the
//! classifier, updates counters, appends a log line and notifies the sink.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::domain::{LogEntry, Result, RunError, RunOutcome, RunReport, RunState, RunStatus};
use crate::obs;
use crate::ports::{Classifier, LogStore, ProgressSink, RecordSource};

/// Delay applied before each record unless configured otherwise.
pub const DEFAULT_RECORD_DELAY: Duration = Duration::from_millis(500);

/// Tuning for processing runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Wait before each record is classified.
    pub record_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            record_delay: DEFAULT_RECORD_DELAY,
        }
    }
}

impl RunConfig {
    pub fn with_record_delay(mut self, delay: Duration) -> Self {
        self.record_delay = delay;
        self
    }
}

/// Releases the run slot when the run task ends, including on panic.
struct SlotGuard {
    slot: Arc<AtomicBool>,
}

impl SlotGuard {
    fn acquire(slot: &Arc<AtomicBool>) -> Option<Self> {
        slot.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                slot: Arc::clone(slot),
            })
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slot.store(false, Ordering::Release);
    }
}

/// Starts processing runs, at most one at a time.
///
/// The run slot belongs to this processor, not to the log path. Give each
/// log file exactly one processor; two processors sharing a path can run
/// together and interleave their lines.
pub struct Processor {
    config: RunConfig,
    log: Arc<dyn LogStore>,
    slot: Arc<AtomicBool>,
}

impl Processor {
    pub fn new(config: RunConfig, log: Arc<dyn LogStore>) -> Self {
        Self {
            config,
            log,
            slot: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Whether a run currently holds the slot.
    pub fn is_running(&self) -> bool {
        self.slot.load(Ordering::Acquire)
    }

    /// Start a run over every record in `source`.
    pub fn start_source(
        &self,
        source: &dyn RecordSource,
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<RunHandle> {
        self.start(source.count(), classifier, sink)
    }

    /// Start a run over records `1..=total_records`.
    ///
    /// Fails with [`RunError::AlreadyRunning`] while another run started
    /// from this processor is still active; that run is not affected.
    /// Must be called from within a tokio runtime.
    pub fn start(
        &self,
        total_records: u64,
        classifier: Arc<dyn Classifier>,
        sink: Arc<dyn ProgressSink>,
    ) -> Result<RunHandle> {
        let guard = SlotGuard::acquire(&self.slot).ok_or_else(|| {
            obs::emit_run_rejected();
            RunError::AlreadyRunning
        })?;

        let run_id = Uuid::new_v4();
        let (state_tx, state_rx) = watch::channel(RunState::new(total_records));
        let cancel = CancellationToken::new();

        let task = RunTask {
            run_id,
            total_records,
            record_delay: self.config.record_delay,
            classifier,
            sink,
            log: Arc::clone(&self.log),
            state_tx,
            cancel: cancel.clone(),
            guard,
        };

        let span = obs::run_span(&run_id.to_string(), total_records);
        let join = tokio::spawn(task.execute().instrument(span));

        Ok(RunHandle {
            run_id,
            state: state_rx,
            cancel,
            join,
        })
    }
}

/// Handle to a started run.
///
/// Dropping the handle does not stop the run.
#[derive(Debug)]
pub struct RunHandle {
    run_id: Uuid,
    state: watch::Receiver<RunState>,
    cancel: CancellationToken,
    join: JoinHandle<RunReport>,
}

impl RunHandle {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Latest published state.
    pub fn snapshot(&self) -> RunState {
        *self.state.borrow()
    }

    /// Watch the latest state. Intermediate states may be skipped; use a
    /// [`ProgressSink`] to see every update.
    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.state.clone()
    }

    /// Ask the run to stop before its next record.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run, e.g. for a Ctrl-C handler.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the run to reach its terminal state.
    pub async fn wait(self) -> Result<RunReport> {
        self.join
            .await
            .map_err(|e| RunError::TaskFailed(e.to_string()))
    }
}

struct RunTask {
    run_id: Uuid,
    total_records: u64,
    record_delay: Duration,
    classifier: Arc<dyn Classifier>,
    sink: Arc<dyn ProgressSink>,
    log: Arc<dyn LogStore>,
    state_tx: watch::Sender<RunState>,
    cancel: CancellationToken,
    guard: SlotGuard,
}

impl RunTask {
    async fn execute(self) -> RunReport {
        let RunTask {
            run_id,
            total_records,
            record_delay,
            classifier,
            sink,
            log,
            state_tx,
            cancel,
            guard,
        } = self;

        let id = run_id.to_string();
        let started_at = Utc::now();
        let clock = tokio::time::Instant::now();
        let mut log_failures = 0u64;

        obs::emit_run_started(&id, total_records);

        if let Err(e) = log.truncate() {
            obs::emit_log_write_failed(&id, "truncate", &e);
            log_failures += 1;
        }

        let mut state = RunState::new(total_records);
        let mut status = RunStatus::Complete;

        for record_index in 1..=total_records {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    status = RunStatus::Cancelled;
                    break;
                }
                _ = tokio::time::sleep(record_delay) => {}
            }

            let outcome = match classifier.classify(record_index).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    obs::emit_classify_failed(&id, record_index, &e);
                    RunOutcome::Failed
                }
            };

            state.record(outcome);
            state_tx.send_replace(state);
            obs::emit_record_processed(&id, record_index, outcome);

            if let Err(e) = log.append(&LogEntry::new(record_index, outcome)) {
                obs::emit_log_write_failed(&id, "append", &e);
                log_failures += 1;
            }

            sink.on_update(state);
        }

        state.finish(status);
        state_tx.send_replace(state);

        let duration_ms = clock.elapsed().as_millis() as u64;
        obs::emit_run_finished(&id, &state, duration_ms);

        // The slot frees before the terminal notification so a sink may
        // start the next run from `on_complete`.
        drop(guard);
        sink.on_complete(state);

        RunReport {
            run_id,
            state,
            started_at,
            finished_at: Utc::now(),
            duration_ms,
            log_failures,
        }
    }
}
