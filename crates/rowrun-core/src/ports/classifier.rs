//! Classifier port: decides the outcome of each record.
//!
//! The processing loop never looks inside a classifier, so real business
//! logic can replace the random stand-in without touching run control flow.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::domain::{ClassifyError, RunOutcome};

/// Strategy that assigns an outcome to one record.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify the record at 1-based `record_index`.
    async fn classify(&self, record_index: u64) -> Result<RunOutcome, ClassifyError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

/// Unweighted coin flip per record.
pub struct RandomClassifier {
    seeded: Option<Mutex<StdRng>>,
}

impl RandomClassifier {
    /// Coin flips from the thread-local generator.
    pub fn new() -> Self {
        Self { seeded: None }
    }

    /// Reproducible coin flips from a seeded generator.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seeded: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Default for RandomClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Classifier for RandomClassifier {
    async fn classify(&self, record_index: u64) -> Result<RunOutcome, ClassifyError> {
        let success = match &self.seeded {
            Some(rng) => {
                let mut rng = rng
                    .lock()
                    .map_err(|_| ClassifyError::new(record_index, "random source poisoned"))?;
                rng.random_bool(0.5)
            }
            None => rand::rng().random_bool(0.5),
        };
        Ok(RunOutcome::from(success))
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// Adapts a plain closure into a [`Classifier`].
pub struct FnClassifier<F> {
    name: String,
    f: F,
}

impl<F> FnClassifier<F>
where
    F: Fn(u64) -> RunOutcome + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> Classifier for FnClassifier<F>
where
    F: Fn(u64) -> RunOutcome + Send + Sync,
{
    async fn classify(&self, record_index: u64) -> Result<RunOutcome, ClassifyError> {
        Ok((self.f)(record_index))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Re-asks an inner classifier while it reports `Failed` or errors.
///
/// Gives up after `max_attempts` and returns the last answer, so a record
/// that never succeeds still ends up `Failed` (or as the inner error).
pub struct RetryingClassifier {
    inner: Arc<dyn Classifier>,
    max_attempts: u32,
}

impl RetryingClassifier {
    pub fn new(inner: Arc<dyn Classifier>, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
        }
    }
}

#[async_trait]
impl Classifier for RetryingClassifier {
    async fn classify(&self, record_index: u64) -> Result<RunOutcome, ClassifyError> {
        let mut attempt = 1;
        loop {
            let result = self.inner.classify(record_index).await;
            if matches!(result, Ok(RunOutcome::Ok)) || attempt >= self.max_attempts {
                return result;
            }
            debug!(
                record = record_index,
                attempt,
                classifier = self.inner.name(),
                "retrying record"
            );
            attempt += 1;
        }
    }

    fn name(&self) -> &str {
        "retrying"
    }
}
