//! Transfer outcomes and per-run counters.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

/// Result of handling one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// Fetched from the source into the mirror.
    Downloaded,
    /// Sent to the target repository.
    Uploaded,
    /// Already present at the destination; nothing transferred.
    SkippedExisting,
    /// Matched a block-list rule.
    SkippedFiltered,
    /// Transfer failed; the string describes why.
    Failed(String),
}

impl TransferOutcome {
    /// Returns true for [`TransferOutcome::Failed`].
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Which pipeline a summary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pipeline {
    /// Source repository to local tree.
    Mirror,
    /// Local tree to target repository.
    Publish,
}

/// Thread-safe counters updated by concurrent transfer tasks.
#[derive(Debug, Default)]
pub struct TransferSummary {
    transferred: AtomicUsize,
    skipped_existing: AtomicUsize,
    skipped_filtered: AtomicUsize,
    failed: AtomicUsize,
}

impl TransferSummary {
    /// Creates a tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one outcome.
    pub fn record(&self, outcome: &TransferOutcome) {
        let counter = match outcome {
            TransferOutcome::Downloaded | TransferOutcome::Uploaded => &self.transferred,
            TransferOutcome::SkippedExisting => &self.skipped_existing,
            TransferOutcome::SkippedFiltered => &self.skipped_filtered,
            TransferOutcome::Failed(_) => &self.failed,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns the number of files transferred.
    #[must_use]
    pub fn transferred(&self) -> usize {
        self.transferred.load(Ordering::SeqCst)
    }

    /// Returns the number of files skipped because they already existed.
    #[must_use]
    pub fn skipped_existing(&self) -> usize {
        self.skipped_existing.load(Ordering::SeqCst)
    }

    /// Returns the number of links suppressed by the block-lists.
    #[must_use]
    pub fn skipped_filtered(&self) -> usize {
        self.skipped_filtered.load(Ordering::SeqCst)
    }

    /// Returns the number of failed transfers.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Returns the sum of all outcomes.
    #[must_use]
    pub fn total(&self) -> usize {
        self.transferred() + self.skipped_existing() + self.skipped_filtered() + self.failed()
    }

    /// Freezes the counters into a reportable value.
    #[must_use]
    pub fn snapshot(&self, pipeline: Pipeline) -> SummarySnapshot {
        SummarySnapshot {
            pipeline,
            transferred: self.transferred(),
            skipped_existing: self.skipped_existing(),
            skipped_filtered: self.skipped_filtered(),
            failed: self.failed(),
            total: self.total(),
        }
    }
}

/// Point-in-time copy of a [`TransferSummary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarySnapshot {
    /// Pipeline that produced the counts.
    pub pipeline: Pipeline,
    /// Downloaded or uploaded files.
    pub transferred: usize,
    /// Files already present at the destination.
    pub skipped_existing: usize,
    /// Links suppressed by the block-lists.
    pub skipped_filtered: usize,
    /// Failed transfers (including failed index pages).
    pub failed: usize,
    /// Sum of the above.
    pub total: usize,
}

impl fmt::Display for SummarySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pipeline {
            Pipeline::Mirror => write!(
                f,
                "mirror: downloaded={} skippedExisting={} skippedFiltered={} failed={} total={}",
                self.transferred,
                self.skipped_existing,
                self.skipped_filtered,
                self.failed,
                self.total
            ),
            Pipeline::Publish => write!(
                f,
                "publish: published={} skippedAlreadyPresent={} failed={} total={}",
                self.transferred, self.skipped_existing, self.failed, self.total
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_summary_default_is_zero() {
        let summary = TransferSummary::default();
        assert_eq!(summary.total(), 0);
        assert_eq!(summary.failed(), 0);
    }

    #[test]
    fn test_record_routes_each_outcome() {
        let summary = TransferSummary::new();
        summary.record(&TransferOutcome::Downloaded);
        summary.record(&TransferOutcome::Uploaded);
        summary.record(&TransferOutcome::SkippedExisting);
        summary.record(&TransferOutcome::SkippedFiltered);
        summary.record(&TransferOutcome::SkippedFiltered);
        summary.record(&TransferOutcome::Failed("HTTP 500".into()));

        assert_eq!(summary.transferred(), 2);
        assert_eq!(summary.skipped_existing(), 1);
        assert_eq!(summary.skipped_filtered(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.total(), 6);
    }

    #[test]
    fn test_summary_thread_safe() {
        let summary = Arc::new(TransferSummary::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let summary = Arc::clone(&summary);
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    summary.record(&TransferOutcome::Uploaded);
                    summary.record(&TransferOutcome::Failed("x".into()));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(summary.transferred(), 400);
        assert_eq!(summary.failed(), 400);
    }

    #[test]
    fn test_publish_snapshot_display() {
        let summary = TransferSummary::new();
        summary.record(&TransferOutcome::Uploaded);
        summary.record(&TransferOutcome::SkippedExisting);
        let text = summary.snapshot(Pipeline::Publish).to_string();
        assert_eq!(
            text,
            "publish: published=1 skippedAlreadyPresent=1 failed=0 total=2"
        );
    }

    #[test]
    fn test_mirror_snapshot_serializes_camel_case() {
        let summary = TransferSummary::new();
        summary.record(&TransferOutcome::Downloaded);
        let json = serde_json::to_value(summary.snapshot(Pipeline::Mirror)).unwrap();
        assert_eq!(json["pipeline"], "mirror");
        assert_eq!(json["transferred"], 1);
        assert_eq!(json["skippedFiltered"], 0);
    }

    #[test]
    fn test_outcome_is_failed() {
        assert!(TransferOutcome::Failed("boom".into()).is_failed());
        assert!(!TransferOutcome::Downloaded.is_failed());
    }
}
