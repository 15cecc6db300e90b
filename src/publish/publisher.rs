//! Republishing of the local mirror tree to a target repository.
//!
//! The walk lists one local directory at a time, schedules an upload for each
//! file into the worker pool, joins the batch, and then descends into the
//! subdirectories with their names appended to the remote base URL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::target::{ProbeStatus, PublishTarget};
use crate::error::{ConfigError, RunError};
use crate::mirror::{append_file, append_segment, as_directory, is_part_file};
use crate::pacing::RateLimiter;
use crate::pool::{DEFAULT_CONCURRENCY, WorkerPool};
use crate::summary::{Pipeline, SummarySnapshot, TransferOutcome, TransferSummary};
use crate::transport::TransferError;

/// Immutable per-run publishing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishPolicy {
    /// Probe the target before uploading and skip present files.
    pub skip_existing: bool,
    /// Stop the run after the first failed upload.
    pub abort_on_error: bool,
    /// Parallel uploads per directory.
    pub concurrency: usize,
    /// Delay before each request a worker issues.
    pub min_interval: Duration,
}

impl Default for PublishPolicy {
    fn default() -> Self {
        Self {
            skip_existing: false,
            abort_on_error: false,
            concurrency: DEFAULT_CONCURRENCY,
            min_interval: Duration::from_millis(1000),
        }
    }
}

/// A local directory waiting to be published.
#[derive(Debug)]
struct PendingDir {
    path: PathBuf,
    url: Url,
}

/// Uploads a local tree below a target root URL.
pub struct Publisher {
    target: Arc<dyn PublishTarget>,
    limiter: Arc<RateLimiter>,
    policy: PublishPolicy,
    pool: WorkerPool,
    summary: Arc<TransferSummary>,
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Publisher {
    /// Creates a publisher with its own rate limiter built from the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] for an unusable pool size.
    pub fn new(target: Arc<dyn PublishTarget>, policy: PublishPolicy) -> Result<Self, ConfigError> {
        let limiter = Arc::new(RateLimiter::new(policy.min_interval));
        Self::with_rate_limiter(target, policy, limiter)
    }

    /// Creates a publisher that paces through an existing limiter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] for an unusable pool size.
    pub fn with_rate_limiter(
        target: Arc<dyn PublishTarget>,
        policy: PublishPolicy,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ConfigError> {
        let pool = WorkerPool::new("publish", policy.concurrency)?;
        debug!(
            concurrency = policy.concurrency,
            interval_ms = limiter.interval().as_millis(),
            skip_existing = policy.skip_existing,
            abort_on_error = policy.abort_on_error,
            "creating publisher"
        );
        Ok(Self {
            target,
            limiter,
            policy,
            pool,
            summary: Arc::new(TransferSummary::new()),
        })
    }

    /// Returns the counts recorded so far.
    #[must_use]
    pub fn summary(&self) -> SummarySnapshot {
        self.summary.snapshot(Pipeline::Publish)
    }

    /// Publishes every file below `mirror_root` to the same relative path
    /// below `target_root`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Filesystem`] if a directory or file cannot be read,
    /// and [`RunError::Aborted`] for a failed upload under `abort_on_error`.
    #[instrument(skip(self), fields(mirror = %mirror_root.display(), target = %target_root))]
    pub async fn publish(
        &self,
        mirror_root: &Path,
        target_root: &Url,
    ) -> Result<SummarySnapshot, RunError> {
        info!("publishing to {target_root}");

        let mut pending = vec![PendingDir {
            path: mirror_root.to_path_buf(),
            url: as_directory(target_root),
        }];

        while let Some(dir) = pending.pop() {
            let subdirs = self.process_dir(&dir).await?;
            pending.extend(subdirs.into_iter().rev());
        }

        let summary = self.summary();
        info!(
            published = summary.transferred,
            skipped_already_present = summary.skipped_existing,
            failed = summary.failed,
            total = summary.total,
            "publishing complete"
        );
        Ok(summary)
    }

    #[instrument(
        level = "debug",
        skip(self, dir),
        fields(dir = %dir.path.display(), url = %dir.url)
    )]
    async fn process_dir(&self, dir: &PendingDir) -> Result<Vec<PendingDir>, RunError> {
        let entries = sorted_entries(&dir.path).await?;

        let mut subdirs = Vec::new();
        let mut batch = self.pool.batch();

        for (path, is_dir) in entries {
            let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
                warn!(path = %path.display(), "skipping entry with a non UTF-8 name");
                continue;
            };

            if is_dir {
                match append_segment(&dir.url, &name) {
                    Ok(url) => subdirs.push(PendingDir { path, url }),
                    Err(e) => warn!(error = %e, "skipping directory"),
                }
                continue;
            }
            if is_part_file(&name) {
                debug!(path = %path.display(), "skipping leftover partial download");
                continue;
            }

            let url = match append_file(&dir.url, &name) {
                Ok(url) => url,
                Err(e) => {
                    warn!(error = %e, "skipping file");
                    continue;
                }
            };
            batch.spawn(
                url.to_string(),
                upload_file(
                    Arc::clone(&self.target),
                    Arc::clone(&self.limiter),
                    self.policy.skip_existing,
                    url,
                    path,
                ),
            );
        }

        if !batch.is_empty() {
            debug!(uploads = batch.len(), "waiting for directory uploads to finish");
        }
        batch.join(&self.summary, self.policy.abort_on_error).await?;
        Ok(subdirs)
    }
}

/// Lists a directory as `(path, is_dir)` pairs sorted by name.
async fn sorted_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>, RunError> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| RunError::filesystem(dir, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| RunError::filesystem(dir, e))?
    {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .await
            .map_err(|e| RunError::filesystem(&path, e))?;
        entries.push((path, file_type.is_dir()));
    }
    entries.sort();
    Ok(entries)
}

/// Probes (optionally) and uploads one file; only local read errors are fatal.
async fn upload_file(
    target: Arc<dyn PublishTarget>,
    limiter: Arc<RateLimiter>,
    skip_existing: bool,
    url: Url,
    path: PathBuf,
) -> Result<TransferOutcome, RunError> {
    if skip_existing {
        limiter.pause().await;
        match target.probe(&url).await {
            Ok(status) => match ProbeStatus::from_status(status) {
                ProbeStatus::Present => {
                    debug!(url = %url, status, "already present, skipping upload");
                    return Ok(TransferOutcome::SkippedExisting);
                }
                ProbeStatus::Absent => {}
                ProbeStatus::Unexpected(status) => {
                    warn!(url = %url, status, "existence probe returned an unexpected status");
                    return Ok(TransferOutcome::Failed(format!("probe returned HTTP {status}")));
                }
            },
            Err(e) => {
                warn!(url = %url, error = %e, "existence probe failed");
                return Ok(TransferOutcome::Failed(e.to_string()));
            }
        }
    }

    limiter.pause().await;
    info!(url = %url, "uploading");

    match target.upload(&url, &path).await {
        Ok(response) if response.is_success() => {
            debug!(url = %url, status = response.status, "upload finished");
            Ok(TransferOutcome::Uploaded)
        }
        Ok(response) => {
            error!(
                url = %url,
                status = response.status,
                body = %response.body,
                "upload rejected"
            );
            Ok(TransferOutcome::Failed(format!("HTTP {}", response.status)))
        }
        Err(TransferError::Io { path, source }) => Err(RunError::filesystem(path, source)),
        Err(e) => {
            error!(url = %url, error = %e, "upload failed");
            Ok(TransferOutcome::Failed(e.to_string()))
        }
    }
}
