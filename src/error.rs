//! Run-level error taxonomy.
//!
//! Transfer failures of single files live in [`crate::transport::TransferError`];
//! this module holds the errors that decide whether a run may continue at all.

use std::path::PathBuf;

use thiserror::Error;

use crate::transport::TransferError;

/// A discovered link lies outside the traversal root.
///
/// Never surfaced to the user: callers drop the link and move on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    /// The URL is on another host or does not extend the root URL.
    #[error("{url} is outside of {root}")]
    OutOfScope {
        /// The rejected URL.
        url: String,
        /// The traversal root it was checked against.
        root: String,
    },

    /// A path segment decodes to something that cannot be a single file name.
    #[error("{url} contains an unsafe path segment {segment:?}")]
    UnsafeSegment {
        /// The rejected URL.
        url: String,
        /// The decoded segment.
        segment: String,
    },
}

impl ScopeError {
    /// Creates an out-of-scope error.
    pub fn out_of_scope(url: impl Into<String>, root: impl Into<String>) -> Self {
        Self::OutOfScope {
            url: url.into(),
            root: root.into(),
        }
    }

    /// Creates an unsafe-segment error.
    pub fn unsafe_segment(url: impl Into<String>, segment: impl Into<String>) -> Self {
        Self::UnsafeSegment {
            url: url.into(),
            segment: segment.into(),
        }
    }
}

/// Invalid configuration detected before any traversal starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A root URL did not parse or is not http(s).
    #[error("invalid {role} root URL {url:?}: {reason}")]
    InvalidRootUrl {
        /// `source` or `target`.
        role: &'static str,
        /// The raw value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An action needs a root URL that was not configured.
    #[error("the {action} action requires a {role} root URL")]
    MissingRootUrl {
        /// The action that needs it.
        action: &'static str,
        /// `source` or `target`.
        role: &'static str,
    },

    /// Only one half of a username/password pair was supplied.
    #[error("{role} credentials need both a user and a password")]
    IncompleteCredentials {
        /// `source` or `target`.
        role: &'static str,
    },

    /// Concurrency outside the accepted range.
    #[error("invalid {pipeline} concurrency {value}: must be between {min} and {max}")]
    InvalidConcurrency {
        /// `crawl` or `publish`.
        pipeline: &'static str,
        /// The rejected value.
        value: usize,
        /// Lower bound.
        min: usize,
        /// Upper bound.
        max: usize,
    },

    /// Neither `mirror` nor `publish` was requested.
    #[error("no actions requested: expected at least one of mirror, publish")]
    NoActions,

    /// Unknown entry in the action list.
    #[error("unknown action {0:?}: expected mirror or publish")]
    UnknownAction(String),

    /// The proxy URL was rejected by the HTTP client.
    #[error("invalid proxy {proxy:?}: {source}")]
    InvalidProxy {
        /// The raw proxy value.
        proxy: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Preflight connectivity check failures.
#[derive(Debug, Error)]
pub enum CheckError {
    /// The source root answered with a non-success status.
    #[error("connection check failed: source at {url} responded with HTTP {status}")]
    SourceStatus {
        /// Source root URL.
        url: String,
        /// Response status.
        status: u16,
    },

    /// The target root answered with something other than 200.
    #[error("connection check failed: target at {url} responded with HTTP {status}")]
    TargetStatus {
        /// Target root URL.
        url: String,
        /// Response status.
        status: u16,
    },

    /// Transport fault while checking either side.
    #[error("connection check failed: {0}")]
    Transport(#[from] TransferError),
}

/// Errors that stop a run.
#[derive(Debug, Error)]
pub enum RunError {
    /// The local mirror cannot be trusted any more.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        /// Offending path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration rejected before traversal.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Preflight check failed.
    #[error(transparent)]
    Check(#[from] CheckError),

    /// A transfer failed while abort-on-error was set.
    #[error("aborted after failed transfer of {url}: {reason}")]
    Aborted {
        /// The URL whose transfer failed first.
        url: String,
        /// Failure description.
        reason: String,
    },
}

impl RunError {
    /// Creates a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Creates an abort error.
    pub fn aborted(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Aborted {
            url: url.into(),
            reason: reason.into(),
        }
    }
}
