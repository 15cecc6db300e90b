//! Fixed-delay pacing for network operations.
//!
//! This module provides the [`RateLimiter`] gate. Every worker calls
//! [`RateLimiter::pause`] before it issues a request, so a single worker never
//! sends two requests less than the configured interval apart. The gate is
//! orthogonal to the worker pool: with `n` concurrent workers the aggregate
//! rate is up to `n` requests per interval.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use repo_cloner::RateLimiter;
//!
//! # async fn example() {
//! let limiter = Arc::new(RateLimiter::new(Duration::from_millis(250)));
//!
//! let worker = Arc::clone(&limiter);
//! tokio::spawn(async move {
//!     worker.pause().await;
//!     // ... issue the request
//! });
//! # }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, instrument, trace};

/// Fixed-delay gate shared by the workers of one pipeline.
///
/// `RateLimiter` is `Send + Sync` and is meant to be wrapped in `Arc`.
#[derive(Debug)]
pub struct RateLimiter {
    /// Delay applied before each operation.
    interval: Duration,

    /// Set once [`RateLimiter::interrupt`] has been called.
    interrupted: AtomicBool,

    /// Wakes workers currently sleeping in [`RateLimiter::pause`].
    wake: Notify,
}

impl RateLimiter {
    /// Creates a gate that sleeps `interval` before each operation.
    #[must_use]
    #[instrument(skip_all, fields(interval_ms = interval.as_millis()))]
    pub fn new(interval: Duration) -> Self {
        debug!("creating rate limiter");
        Self {
            interval,
            interrupted: AtomicBool::new(false),
            wake: Notify::new(),
        }
    }

    /// Creates a gate that never sleeps.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Returns the configured interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns whether pacing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.interval.is_zero()
    }

    /// Waits out the interval before the caller's next operation.
    ///
    /// An interruption never fails the operation: the caller simply proceeds
    /// without the remaining delay.
    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }

        let woken = self.wake.notified();
        tokio::pin!(woken);
        woken.as_mut().enable();

        if self.interrupted.load(Ordering::SeqCst) {
            trace!("rate limiter interrupted - no delay");
            return;
        }

        tokio::select! {
            () = tokio::time::sleep(self.interval) => {}
            () = woken => {
                debug!("rate limit pause interrupted - proceeding without delay");
            }
        }
    }

    /// Cuts short every current and future pause.
    pub fn interrupt(&self) {
        self.interrupted.store(true, Ordering::SeqCst);
        self.wake.notify_waiters();
    }
}
