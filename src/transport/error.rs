//! Error type for single network transfers.
//!
//! Every variant carries the URL or path it concerns so the failure can be
//! reported without extra context from the caller.

use std::path::PathBuf;

use thiserror::Error;

use super::constants::MAX_ERROR_BODY_CHARS;

/// Errors from fetching an index page, downloading an artifact, probing or
/// uploading.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Network-level error (DNS resolution, connection refused, TLS, reset).
    #[error("network error for {url}: {source}")]
    Network {
        /// The URL of the failed request.
        url: String,
        /// The underlying client error.
        #[source]
        source: reqwest::Error,
    },

    /// Request did not complete within its timeout.
    #[error("timeout for {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} for {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// Truncated response body, if any was readable.
        body: Option<String>,
    },

    /// Local file could not be read or written.
    #[error("IO error at {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// Maps a reqwest error, separating timeouts from other network faults.
    pub fn from_reqwest(url: impl Into<String>, source: reqwest::Error) -> Self {
        let url = url.into();
        if source.is_timeout() {
            Self::Timeout { url }
        } else {
            Self::Network { url, source }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16, body: Option<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            body,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns the HTTP status for status errors.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the truncated response body for status errors.
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::HttpStatus { body, .. } => body.as_deref(),
            _ => None,
        }
    }
}

/// Truncates a response body for log output.
#[must_use]
pub fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_display() {
        let error = TransferError::http_status("https://repo.example/a/x.jar", 503, None);
        let msg = error.to_string();
        assert!(msg.contains("503"), "Expected status in: {msg}");
        assert!(msg.contains("https://repo.example/a/x.jar"));
        assert_eq!(error.status(), Some(503));
        assert_eq!(error.body(), None);
    }

    #[test]
    fn test_http_status_keeps_body() {
        let error = TransferError::http_status("https://repo.example/", 401, Some("denied".into()));
        assert_eq!(error.body(), Some("denied"));
    }

    #[test]
    fn test_io_error_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full");
        let error = TransferError::io("/mirror/x.jar", io);
        assert!(matches!(error, TransferError::Io { .. }));
        assert!(error.to_string().contains("/mirror/x.jar"));
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_timeout_display() {
        let error = TransferError::Timeout {
            url: "https://repo.example/".into(),
        };
        assert!(error.to_string().starts_with("timeout"));
    }

    #[test]
    fn test_truncate_body_short_kept() {
        assert_eq!(truncate_body("  Conflict \n"), "Conflict");
    }

    #[test]
    fn test_truncate_body_long_cut() {
        let body = "x".repeat(MAX_ERROR_BODY_CHARS + 100);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), MAX_ERROR_BODY_CHARS + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_body_respects_char_boundaries() {
        let body = "é".repeat(MAX_ERROR_BODY_CHARS + 1);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY_CHARS + 3);
    }
}
