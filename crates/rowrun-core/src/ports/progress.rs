//! Progress reporting port for UI integration.

use tokio::sync::mpsc;

use crate::domain::RunState;

/// Port for receiving ordered run updates.
///
/// Both methods are called from the run's task. Implementations that feed
/// a single-threaded front end should post to that front end's queue
/// instead of touching its state (see [`ChannelSink`]).
pub trait ProgressSink: Send + Sync {
    /// Called after each record, in processing order.
    fn on_update(&self, state: RunState);

    /// Called exactly once when the run reaches a terminal state.
    fn on_complete(&self, state: RunState);
}

/// Message posted by [`ChannelSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkMessage {
    /// Progress after one more record.
    Update(RunState),
    /// The run reached its terminal state.
    Complete(RunState),
}

impl SinkMessage {
    pub fn state(&self) -> &RunState {
        match self {
            SinkMessage::Update(state) | SinkMessage::Complete(state) => state,
        }
    }
}

/// Sink that forwards every notification over a FIFO channel.
///
/// The receiving side drains messages on its own task, so updates arrive
/// in the order the run produced them.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkMessage>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SinkMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn post(&self, message: SinkMessage) {
        // A dropped receiver just means nobody is watching anymore.
        if self.tx.send(message).is_err() {
            tracing::trace!("progress receiver dropped");
        }
    }
}

impl ProgressSink for ChannelSink {
    fn on_update(&self, state: RunState) {
        self.post(SinkMessage::Update(state));
    }

    fn on_complete(&self, state: RunState) {
        self.post(SinkMessage::Complete(state));
    }
}

/// Sink that ignores all notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_update(&self, _state: RunState) {}

    fn on_complete(&self, _state: RunState) {}
}
