//! Recursive mirroring of an HTML-indexed repository onto disk.
//!
//! For each index page the crawler ensures the local directory exists, fetches
//! the page, classifies every link, downloads the new artifacts through the
//! worker pool and joins them, and only then descends into the subdirectories
//! it found. Pages are walked depth-first from an explicit stack.
//!
//! # Failure handling
//!
//! - An index page that cannot be fetched stops descent into that branch only.
//! - A failed artifact download is counted; with `abort_on_error` it ends the
//!   run once the rest of the page's downloads have finished.
//! - A local filesystem error always ends the run.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, trace, warn};
use url::Url;

use super::filter::{LinkClass, LinkFilter};
use super::path_map::{as_directory, local_path, strip_query};
use super::source::IndexSource;
use super::store::write_atomically;
use crate::error::{ConfigError, RunError};
use crate::pacing::RateLimiter;
use crate::pool::{DEFAULT_CONCURRENCY, WorkerPool};
use crate::summary::{Pipeline, SummarySnapshot, TransferOutcome, TransferSummary};
use crate::transport::TransferError;

/// Default cap on index page nesting below the root.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Immutable crawl settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlPolicy {
    /// Parallel artifact downloads per page.
    pub concurrency: usize,
    /// Delay before each request a worker issues.
    pub min_interval: Duration,
    /// Stop the run after the first failed download.
    pub abort_on_error: bool,
    /// Deepest page level that is still visited (root is level 0).
    pub max_depth: usize,
}

impl Default for CrawlPolicy {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            min_interval: Duration::from_millis(1000),
            abort_on_error: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// An index page waiting to be visited.
#[derive(Debug)]
struct PendingPage {
    url: Url,
    dir: PathBuf,
    depth: usize,
}

/// Mirrors a remote index tree into a local directory.
pub struct Crawler {
    source: Arc<dyn IndexSource>,
    filter: Arc<LinkFilter>,
    limiter: Arc<RateLimiter>,
    policy: CrawlPolicy,
    pool: WorkerPool,
    summary: Arc<TransferSummary>,
}

impl std::fmt::Debug for Crawler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crawler")
            .field("filter", &self.filter)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Crawler {
    /// Creates a crawler with its own rate limiter built from the policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] for an unusable pool size.
    pub fn new(
        source: Arc<dyn IndexSource>,
        filter: LinkFilter,
        policy: CrawlPolicy,
    ) -> Result<Self, ConfigError> {
        let limiter = Arc::new(RateLimiter::new(policy.min_interval));
        Self::with_rate_limiter(source, filter, policy, limiter)
    }

    /// Creates a crawler that paces through an existing limiter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConcurrency`] for an unusable pool size.
    pub fn with_rate_limiter(
        source: Arc<dyn IndexSource>,
        filter: LinkFilter,
        policy: CrawlPolicy,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, ConfigError> {
        let pool = WorkerPool::new("crawl", policy.concurrency)?;
        debug!(
            concurrency = policy.concurrency,
            interval_ms = limiter.interval().as_millis(),
            max_depth = policy.max_depth,
            abort_on_error = policy.abort_on_error,
            "creating crawler"
        );
        Ok(Self {
            source,
            filter: Arc::new(filter),
            limiter,
            policy,
            pool,
            summary: Arc::new(TransferSummary::new()),
        })
    }

    /// Returns the counts recorded so far.
    #[must_use]
    pub fn summary(&self) -> SummarySnapshot {
        self.summary.snapshot(Pipeline::Mirror)
    }

    /// Mirrors everything reachable below `root` into `mirror_root`.
    ///
    /// Artifacts already present locally are not downloaded again, so running
    /// the crawl twice against an unchanged source transfers nothing the
    /// second time.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Filesystem`] if a directory or file cannot be
    /// created, and [`RunError::Aborted`] for a failed download under
    /// `abort_on_error`.
    #[instrument(skip(self), fields(root = %root, mirror = %mirror_root.display()))]
    pub async fn mirror(
        &self,
        root: &Url,
        mirror_root: &Path,
    ) -> Result<SummarySnapshot, RunError> {
        let root = as_directory(root);
        info!("mirroring from {root}");

        let mut pending = vec![PendingPage {
            url: root.clone(),
            dir: mirror_root.to_path_buf(),
            depth: 0,
        }];

        while let Some(page) = pending.pop() {
            let subpages = self.process_page(&root, mirror_root, &page).await?;
            // Reversed so the stack visits siblings in page order.
            pending.extend(subpages.into_iter().rev());
        }

        let summary = self.summary();
        info!(
            downloaded = summary.transferred,
            skipped_existing = summary.skipped_existing,
            skipped_filtered = summary.skipped_filtered,
            failed = summary.failed,
            "download complete"
        );
        Ok(summary)
    }

    #[instrument(
        level = "debug",
        skip(self, root, mirror_root, page),
        fields(page = %page.url, depth = page.depth)
    )]
    async fn process_page(
        &self,
        root: &Url,
        mirror_root: &Path,
        page: &PendingPage,
    ) -> Result<Vec<PendingPage>, RunError> {
        debug!(dir = %page.dir.display(), "switching to mirror directory");
        tokio::fs::create_dir_all(&page.dir)
            .await
            .map_err(|e| RunError::filesystem(&page.dir, e))?;

        self.limiter.pause().await;
        let links = match self.source.list_links(&page.url).await {
            Ok(links) => links,
            Err(e) => {
                warn!(
                    page = %page.url,
                    error = %e,
                    body = e.body().unwrap_or_default(),
                    "failed to fetch index page, skipping branch"
                );
                self.summary.record(&TransferOutcome::Failed(e.to_string()));
                return Ok(Vec::new());
            }
        };

        // Keyed by local path: distinct spellings of one URL (`x.jar`, `%78.jar`)
        // land on the same file and must be written by a single worker.
        let mut claimed: HashSet<PathBuf> = HashSet::new();
        let mut subpages = Vec::new();
        let mut batch = self.pool.batch();

        for link in links {
            let link = strip_query(&link);
            trace!(link = %link, "found link");

            match self.filter.classify(&page.url, &link) {
                LinkClass::Ignore => {
                    trace!(link = %link, "ignoring link: destination outside of scope");
                }
                LinkClass::File {
                    filename,
                    extension,
                } => {
                    let target = match local_path(mirror_root, root, &link) {
                        Ok(target) => target,
                        Err(e) => {
                            trace!(error = %e, "ignoring link");
                            continue;
                        }
                    };
                    if !claimed.insert(target.clone()) {
                        trace!(link = %link, path = %target.display(), "duplicate link");
                        continue;
                    }
                    if let Some(reason) = self.filter.block_reason(&filename, &extension) {
                        trace!(file = %filename, ?reason, "ignoring link: on block-list");
                        self.summary.record(&TransferOutcome::SkippedFiltered);
                        continue;
                    }
                    if target_exists(&target).await? {
                        debug!(path = %target.display(), "file already exists, skipping download");
                        self.summary.record(&TransferOutcome::SkippedExisting);
                        continue;
                    }
                    batch.spawn(
                        link.to_string(),
                        download_artifact(
                            Arc::clone(&self.source),
                            Arc::clone(&self.limiter),
                            link,
                            target,
                        ),
                    );
                }
                LinkClass::Directory => {
                    let dir_url = as_directory(&link);
                    if page.depth >= self.policy.max_depth {
                        warn!(
                            link = %dir_url,
                            max_depth = self.policy.max_depth,
                            "maximum depth reached, not recursing"
                        );
                        continue;
                    }
                    let dir = match local_path(mirror_root, root, &dir_url) {
                        Ok(dir) => dir,
                        Err(e) => {
                            trace!(error = %e, "ignoring link");
                            continue;
                        }
                    };
                    if !claimed.insert(dir.clone()) {
                        trace!(link = %dir_url, path = %dir.display(), "duplicate link");
                        continue;
                    }
                    trace!(link = %dir_url, "mark for recursion");
                    subpages.push(PendingPage {
                        url: dir_url,
                        dir,
                        depth: page.depth + 1,
                    });
                }
            }
        }

        if !batch.is_empty() {
            debug!(downloads = batch.len(), "waiting for directory downloads to finish");
        }
        batch.join(&self.summary, self.policy.abort_on_error).await?;

        for subpage in &subpages {
            debug!(link = %subpage.url, "recursing into subdirectory");
        }
        Ok(subpages)
    }
}

async fn target_exists(target: &Path) -> Result<bool, RunError> {
    tokio::fs::try_exists(target)
        .await
        .map_err(|e| RunError::filesystem(target, e))
}

/// Downloads one artifact; only local filesystem failures are fatal.
async fn download_artifact(
    source: Arc<dyn IndexSource>,
    limiter: Arc<RateLimiter>,
    url: Url,
    target: PathBuf,
) -> Result<TransferOutcome, RunError> {
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RunError::filesystem(parent, e))?;
    }

    limiter.pause().await;
    info!(url = %url, "downloading");

    let result = match source.open(&url).await {
        Ok(stream) => write_atomically(&target, stream).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(bytes) => {
            debug!(path = %target.display(), bytes, "download finished");
            Ok(TransferOutcome::Downloaded)
        }
        Err(TransferError::Io { path, source }) => Err(RunError::filesystem(path, source)),
        Err(e) => {
            warn!(url = %url, error = %e, body = e.body().unwrap_or_default(), "download failed");
            Ok(TransferOutcome::Failed(e.to_string()))
        }
    }
}
