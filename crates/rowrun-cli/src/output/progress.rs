//! Progress bar view for processing runs, using indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use rowrun_core::{LogTail, RunState, SinkMessage};
use tracing::warn;

/// Renders run progress on stderr and, optionally, the run log as it grows.
///
/// Fed from the receiving end of a `ChannelSink`, so it runs on the
/// command's task and never touches run state directly.
pub struct ProgressView {
    bar: ProgressBar,
    tail: Option<LogTail>,
}

impl ProgressView {
    /// * `total` - records in the run
    /// * `show_bar` - draw the bar; otherwise the view stays hidden
    /// * `tail` - log to echo after each update
    #[must_use]
    pub fn new(total: u64, show_bar: bool, tail: Option<LogTail>) -> Self {
        let bar = if show_bar {
            let bar = ProgressBar::new(total);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        Self { bar, tail }
    }

    /// Apply one message from the run. Returns the state on completion.
    pub fn handle(&mut self, message: SinkMessage) -> Option<RunState> {
        match message {
            SinkMessage::Update(state) => {
                self.show(&state);
                self.echo_log();
                None
            }
            SinkMessage::Complete(state) => {
                self.show(&state);
                self.echo_log();
                self.bar.finish_and_clear();
                Some(state)
            }
        }
    }

    fn show(&self, state: &RunState) {
        self.bar.set_position(state.processed_count);
        self.bar
            .set_message(format!("OK {} / Failed {}", state.ok_count, state.failed_count));
    }

    fn echo_log(&mut self) {
        let Some(tail) = self.tail.as_mut() else {
            return;
        };
        match tail.poll() {
            Ok(lines) => {
                for line in lines {
                    if self.bar.is_hidden() {
                        eprintln!("{line}");
                    } else {
                        self.bar.println(line);
                    }
                }
            }
            Err(e) => warn!("Failed to read run log: {e}"),
        }
    }
}
