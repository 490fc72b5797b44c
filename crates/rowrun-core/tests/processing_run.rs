//! Integration tests for processing runs (Processor → LogStore / ProgressSink).

use std::sync::Arc;
use std::time::Duration;

use rowrun_core::fakes::{MemoryLogStore, RecordingSink, ScriptedClassifier};
use rowrun_core::{
    ChannelSink, FileLogStore, FnClassifier, LogEntry, LogStore, NullSink, Processor,
    RandomClassifier, RunConfig, RunError, RunOutcome, RunStatus, SinkMessage,
};

fn fast_config() -> RunConfig {
    RunConfig::default().with_record_delay(Duration::from_millis(5))
}

fn alternating(n: u64) -> Vec<RunOutcome> {
    (1..=n).map(|i| RunOutcome::from(i % 3 != 0)).collect()
}

#[tokio::test(start_paused = true)]
async fn completed_run_processes_every_record() {
    for total in [0u64, 1, 2, 7, 25] {
        let log = Arc::new(MemoryLogStore::new());
        let processor = Processor::new(fast_config(), log.clone());
        let report = processor
            .start(total, Arc::new(RandomClassifier::seeded(total)), Arc::new(NullSink))
            .expect("start")
            .wait()
            .await
            .expect("wait");

        assert_eq!(report.state.status, RunStatus::Complete);
        assert_eq!(report.state.processed_count, total);
        assert_eq!(report.state.ok_count + report.state.failed_count, total);
        assert_eq!(log.entries().len() as u64, total);
    }
}

#[tokio::test(start_paused = true)]
async fn sink_sees_strictly_increasing_progress() {
    let sink = Arc::new(RecordingSink::new());
    let processor = Processor::new(fast_config(), Arc::new(MemoryLogStore::new()));
    processor
        .start(12, Arc::new(RandomClassifier::seeded(3)), sink.clone())
        .expect("start")
        .wait()
        .await
        .expect("wait");

    let processed: Vec<u64> = sink.updates().iter().map(|s| s.processed_count).collect();
    assert_eq!(processed, (1..=12).collect::<Vec<_>>());
    for state in sink.updates() {
        assert_eq!(state.processed_count, state.ok_count + state.failed_count);
        assert!(state.is_running());
    }

    let messages = sink.messages();
    assert!(matches!(messages.last(), Some(SinkMessage::Complete(_))));
    assert_eq!(sink.completions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn start_while_running_leaves_active_run_alone() {
    let log = Arc::new(MemoryLogStore::new());
    let processor = Processor::new(fast_config(), log.clone());
    let script = alternating(6);
    let handle = processor
        .start(
            6,
            Arc::new(ScriptedClassifier::new(script.clone())),
            Arc::new(NullSink),
        )
        .expect("start");

    tokio::time::sleep(Duration::from_millis(12)).await;
    let before = handle.snapshot();

    let err = processor
        .start(3, Arc::new(RandomClassifier::new()), Arc::new(NullSink))
        .unwrap_err();
    assert!(matches!(err, RunError::AlreadyRunning));
    assert_eq!(handle.snapshot().total_records, before.total_records);
    assert!(handle.snapshot().processed_count >= before.processed_count);

    let report = handle.wait().await.expect("wait");
    assert_eq!(report.state.total_records, 6);
    assert_eq!(report.state.processed_count, 6);
    assert_eq!(log.truncations(), 1);
    assert_eq!(
        log.entries().iter().map(|e| e.outcome).collect::<Vec<_>>(),
        script
    );
}

#[tokio::test(start_paused = true)]
async fn file_log_has_one_ordered_line_per_record() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(FileLogStore::new(dir.path().join("execution.log")));
    store
        .append(&LogEntry::new(99, RunOutcome::Ok))
        .expect("stale line from an earlier run");

    let processor = Processor::new(fast_config(), store.clone());
    processor
        .start(5, Arc::new(RandomClassifier::seeded(11)), Arc::new(NullSink))
        .expect("start")
        .wait()
        .await
        .expect("wait");

    let lines = store.read_lines().expect("read log");
    assert_eq!(lines.len(), 5);
    for (i, line) in lines.iter().enumerate() {
        let entry: LogEntry = line.parse().expect("well-formed line");
        assert_eq!(entry.record_index, i as u64 + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn empty_run_completes_once_without_log_lines() {
    let log = Arc::new(MemoryLogStore::new());
    let sink = Arc::new(RecordingSink::new());
    let processor = Processor::new(RunConfig::default(), log.clone());
    let report = processor
        .start(0, Arc::new(RandomClassifier::new()), sink.clone())
        .expect("start")
        .wait()
        .await
        .expect("wait");

    assert!(report.completed());
    assert_eq!(report.duration_ms, 0);
    assert!(log.lines().is_empty());
    assert_eq!(log.truncations(), 1);
    assert!(sink.updates().is_empty());
    assert_eq!(sink.completions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn log_failure_does_not_change_totals() {
    let script = alternating(5);

    let clean_log = Arc::new(MemoryLogStore::new());
    let clean = Processor::new(fast_config(), clean_log)
        .start(
            5,
            Arc::new(ScriptedClassifier::new(script.clone())),
            Arc::new(NullSink),
        )
        .expect("start")
        .wait()
        .await
        .expect("wait");

    let broken_log = Arc::new(MemoryLogStore::new().failing_truncate().failing_append_at(3));
    let broken = Processor::new(fast_config(), broken_log.clone())
        .start(5, Arc::new(ScriptedClassifier::new(script)), Arc::new(NullSink))
        .expect("start")
        .wait()
        .await
        .expect("wait");

    assert_eq!(clean.state.processed_count, broken.state.processed_count);
    assert_eq!(clean.state.ok_count, broken.state.ok_count);
    assert_eq!(clean.state.failed_count, broken.state.failed_count);
    assert_eq!(clean.log_failures, 0);
    assert_eq!(broken.log_failures, 2);
    assert_eq!(broken_log.entries().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn scripted_three_record_scenario() {
    let log = Arc::new(MemoryLogStore::new());
    let classifier = Arc::new(ScriptedClassifier::new(vec![
        RunOutcome::Ok,
        RunOutcome::Failed,
        RunOutcome::Ok,
    ]));
    let report = Processor::new(RunConfig::default(), log.clone())
        .start(3, classifier, Arc::new(NullSink))
        .expect("start")
        .wait()
        .await
        .expect("wait");

    assert_eq!(report.state.processed_count, 3);
    assert_eq!(report.state.ok_count, 2);
    assert_eq!(report.state.failed_count, 1);
    assert_eq!(
        log.lines(),
        vec!["Record 1: OK", "Record 2: Failed", "Record 3: OK"]
    );
}

#[tokio::test(start_paused = true)]
async fn classifier_error_counts_as_failed() {
    let log = Arc::new(MemoryLogStore::new());
    let classifier = Arc::new(ScriptedClassifier::from_results(vec![
        Ok(RunOutcome::Ok),
        Err("upstream timeout".to_string()),
    ]));
    let report = Processor::new(fast_config(), log.clone())
        .start(2, classifier, Arc::new(NullSink))
        .expect("start")
        .wait()
        .await
        .expect("wait");

    assert_eq!(report.state.ok_count, 1);
    assert_eq!(report.state.failed_count, 1);
    assert_eq!(log.lines(), vec!["Record 1: OK", "Record 2: Failed"]);
}

#[tokio::test(start_paused = true)]
async fn cancel_stops_before_next_record() {
    let log = Arc::new(MemoryLogStore::new());
    let sink = Arc::new(RecordingSink::new());
    let processor = Processor::new(RunConfig::default(), log.clone());
    let handle = processor
        .start(10, Arc::new(RandomClassifier::seeded(5)), sink.clone())
        .expect("start");

    let mut rx = handle.subscribe();
    rx.wait_for(|s| s.processed_count == 2)
        .await
        .expect("two records");
    handle.cancel();

    let report = handle.wait().await.expect("wait");
    assert_eq!(report.state.status, RunStatus::Cancelled);
    assert!(!report.completed());
    assert_eq!(report.state.processed_count, 2);
    assert_eq!(log.entries().len(), 2);
    assert_eq!(sink.completions().len(), 1);
    assert!(!processor.is_running());
}

#[tokio::test(start_paused = true)]
async fn channel_sink_delivers_in_order() {
    let (sink, mut rx) = ChannelSink::new();
    let processor = Processor::new(fast_config(), Arc::new(MemoryLogStore::new()));
    let classifier = Arc::new(FnClassifier::new("odd-ok", |i| RunOutcome::from(i % 2 == 1)));
    let handle = processor
        .start(4, classifier, Arc::new(sink))
        .expect("start");

    let mut seen = Vec::new();
    while let Some(message) = rx.recv().await {
        let done = matches!(message, SinkMessage::Complete(_));
        seen.push(message);
        if done {
            break;
        }
    }
    handle.wait().await.expect("wait");

    assert_eq!(seen.len(), 5);
    let last = *seen[4].state();
    assert_eq!((last.ok_count, last.failed_count), (2, 2));
    assert!(!last.is_running());
}
