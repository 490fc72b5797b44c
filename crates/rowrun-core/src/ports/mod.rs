//! Ports the processing run consumes.

pub mod classifier;
pub mod log_store;
pub mod progress;
pub mod record_source;

pub use classifier::{Classifier, FnClassifier, RandomClassifier, RetryingClassifier};
pub use log_store::LogStore;
pub use progress::{ChannelSink, NullSink, ProgressSink, SinkMessage};
pub use record_source::{FixedCount, RecordSource};
