//! Repository Cloner Library
//!
//! Mirrors an artifact repository that is only reachable through nested HTML
//! index pages onto a local directory tree, and republishes that tree to
//! another repository with HTTP PUT.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`mirror`] - Index crawling, link filtering, path mapping, atomic writes
//! - [`publish`] - Directory walk and uploads with existence probes
//! - [`transport`] - Credentials, HTTP client construction, transfer errors
//! - [`pacing`] - Fixed-delay rate limiter
//! - [`pool`] - Bounded worker pool with a per-directory join barrier
//! - [`runner`] - Runs the configured actions in order

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod check;
pub mod config;
pub mod error;
pub mod mirror;
pub mod pacing;
pub mod pool;
pub mod publish;
pub mod runner;
pub mod summary;
pub mod transport;

// Re-export commonly used types
pub use config::{Actions, DEFAULT_ACTIONS, DEFAULT_MIRROR_PATH, Endpoint, RunConfig, Timeouts};
pub use error::{CheckError, ConfigError, RunError, ScopeError};
pub use mirror::{CrawlPolicy, Crawler, HttpSource, IndexSource, LinkFilter};
pub use pacing::RateLimiter;
pub use pool::{DEFAULT_CONCURRENCY, MAX_CONCURRENCY, MIN_CONCURRENCY};
pub use publish::{HttpTarget, PublishPolicy, PublishTarget, Publisher};
pub use runner::{RunReport, RunStatus, run};
pub use summary::{Pipeline, SummarySnapshot, TransferOutcome, TransferSummary};
pub use transport::{Credentials, RequestTimeout, TransferError, TransportConfig};
