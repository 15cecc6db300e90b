//! Bounded worker pool with a per-directory join barrier.
//!
//! Both pipelines walk their tree on a single control flow and only hand the
//! leaf operations (one download, one upload) to the pool. All leaf
//! operations of one directory form a [`Batch`]; the walk joins the batch
//! before it descends any further, so a failure at one depth is known before
//! deeper work starts.
//!
//! # Concurrency Model
//!
//! - Each transfer runs in its own Tokio task
//! - A semaphore permit is acquired inside the task before any I/O
//! - Permits are released when the task finishes (RAII)
//! - [`Batch::join`] waits for every task, even after a failure, so in-flight
//!   siblings are never cut off

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::error::{ConfigError, RunError};
use crate::summary::{TransferOutcome, TransferSummary};

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 100;

/// Default concurrency for both pipelines.
pub const DEFAULT_CONCURRENCY: usize = 4;

type TaskResult = Result<TransferOutcome, RunError>;

/// Validates a configured pool size.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidConcurrency`] outside `1..=100`.
pub fn validate_concurrency(pipeline: &'static str, value: usize) -> Result<(), ConfigError> {
    if (MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidConcurrency {
            pipeline,
            value,
            min: MIN_CONCURRENCY,
            max: MAX_CONCURRENCY,
        })
    }
}

/// Fixed-size pool of transfer slots.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    /// Creates a pool with `size` slots.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] outside `1..=100`.
    pub fn new(pipeline: &'static str, size: usize) -> Result<Self, ConfigError> {
        validate_concurrency(pipeline, size)?;
        Ok(Self {
            semaphore: Arc::new(Semaphore::new(size)),
        })
    }

    /// Starts an empty batch on this pool.
    #[must_use]
    pub fn batch(&self) -> Batch {
        Batch {
            semaphore: Arc::clone(&self.semaphore),
            tasks: Vec::new(),
        }
    }
}

/// Transfers scheduled for one directory.
#[derive(Debug)]
pub struct Batch {
    semaphore: Arc<Semaphore>,
    tasks: Vec<(String, JoinHandle<TaskResult>)>,
}

impl Batch {
    /// Schedules a transfer; it starts as soon as a slot is free.
    pub fn spawn<F>(&mut self, url: String, transfer: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return Ok(TransferOutcome::Failed("worker pool closed".into()));
            };
            transfer.await
        });
        self.tasks.push((url, handle));
    }

    /// Returns the number of scheduled transfers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true when nothing was scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every scheduled transfer and records its outcome.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error any task produced. Otherwise, with
    /// `abort_on_error`, returns [`RunError::Aborted`] for the first failed
    /// transfer in scheduling order.
    #[instrument(level = "debug", skip_all, fields(tasks = self.tasks.len()))]
    pub async fn join(
        self,
        summary: &TransferSummary,
        abort_on_error: bool,
    ) -> Result<(), RunError> {
        debug!("waiting for batch to complete");

        let mut fatal: Option<RunError> = None;
        let mut first_failure: Option<(String, String)> = None;

        for (url, handle) in self.tasks {
            let outcome = match handle.await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    error!(url = %url, error = %e, "fatal error during transfer");
                    fatal.get_or_insert(e);
                    continue;
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "transfer task panicked");
                    TransferOutcome::Failed(format!("task panicked: {e}"))
                }
            };

            if let TransferOutcome::Failed(reason) = &outcome {
                first_failure.get_or_insert_with(|| (url.clone(), reason.clone()));
            }
            summary.record(&outcome);
        }

        if let Some(e) = fatal {
            return Err(e);
        }
        match first_failure {
            Some((url, reason)) if abort_on_error => Err(RunError::aborted(url, reason)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_pool_valid_sizes() {
        assert!(WorkerPool::new("crawl", 1).is_ok());
        assert!(WorkerPool::new("crawl", 100).is_ok());
    }

    #[test]
    fn test_pool_rejects_zero_and_too_high() {
        assert!(matches!(
            WorkerPool::new("publish", 0),
            Err(ConfigError::InvalidConcurrency { value: 0, .. })
        ));
        assert!(matches!(
            WorkerPool::new("publish", 101),
            Err(ConfigError::InvalidConcurrency { value: 101, .. })
        ));
    }

    #[test]
    fn test_invalid_concurrency_display() {
        let msg = validate_concurrency("publish", 0).unwrap_err().to_string();
        assert!(msg.contains("publish"));
        assert!(msg.contains("between 1 and 100"));
    }

    #[tokio::test]
    async fn test_batch_respects_pool_size() {
        let pool = WorkerPool::new("crawl", 2).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut batch = pool.batch();
        for i in 0..8 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            batch.spawn(format!("https://repo.example/{i}.jar"), async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(TransferOutcome::Downloaded)
            });
        }
        assert_eq!(batch.len(), 8);

        let summary = TransferSummary::new();
        batch.join(&summary, false).await.unwrap();

        assert_eq!(summary.transferred(), 8);
        assert!(peak.load(Ordering::SeqCst) <= 2, "pool size exceeded");
    }

    #[tokio::test]
    async fn test_join_records_failures_without_abort() {
        let pool = WorkerPool::new("publish", 4).unwrap();
        let mut batch = pool.batch();
        batch.spawn("a".into(), async { Ok(TransferOutcome::Uploaded) });
        batch.spawn("b".into(), async { Ok(TransferOutcome::Failed("HTTP 500".into())) });
        batch.spawn("c".into(), async { Ok(TransferOutcome::Failed("HTTP 502".into())) });

        let summary = TransferSummary::new();
        assert!(batch.join(&summary, false).await.is_ok());
        assert_eq!(summary.failed(), 2);
        assert_eq!(summary.transferred(), 1);
    }

    #[tokio::test]
    async fn test_join_aborts_on_first_failure_after_siblings_finish() {
        let pool = WorkerPool::new("publish", 4).unwrap();
        let finished = Arc::new(AtomicUsize::new(0));

        let mut batch = pool.batch();
        batch.spawn("https://t.example/a".into(), async {
            Ok(TransferOutcome::Failed("HTTP 500".into()))
        });
        let done = Arc::clone(&finished);
        batch.spawn("https://t.example/b".into(), async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            done.fetch_add(1, Ordering::SeqCst);
            Ok(TransferOutcome::Uploaded)
        });

        let summary = TransferSummary::new();
        let result = batch.join(&summary, true).await;

        assert!(
            matches!(result, Err(RunError::Aborted { ref url, .. }) if url == "https://t.example/a")
        );
        assert_eq!(finished.load(Ordering::SeqCst), 1, "sibling must finish");
        assert_eq!(summary.total(), 2);
    }

    #[tokio::test]
    async fn test_join_fatal_error_wins_regardless_of_policy() {
        let pool = WorkerPool::new("crawl", 1).unwrap();
        let mut batch = pool.batch();
        batch.spawn("x".into(), async {
            Err(RunError::filesystem(
                "/mirror/x.jar",
                std::io::Error::new(std::io::ErrorKind::StorageFull, "full"),
            ))
        });
        batch.spawn("y".into(), async { Ok(TransferOutcome::Downloaded) });

        let summary = TransferSummary::new();
        let result = batch.join(&summary, false).await;
        assert!(matches!(result, Err(RunError::Filesystem { .. })));
        assert_eq!(summary.transferred(), 1);
    }

    #[tokio::test]
    async fn test_empty_batch_joins_immediately() {
        let pool = WorkerPool::new("crawl", 1).unwrap();
        let batch = pool.batch();
        assert!(batch.is_empty());
        assert!(batch.join(&TransferSummary::new(), true).await.is_ok());
    }
}
