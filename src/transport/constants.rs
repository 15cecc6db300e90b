//! Constants for the transport layer (timeouts, limits, identification).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default idle timeout for index page fetches and artifact downloads (5 minutes).
pub const DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Default timeout for uploads (15 minutes, artifacts may be large).
pub const UPLOAD_TIMEOUT_SECS: u64 = 900;

/// Maximum number of response body characters kept for error reports.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

/// Default User-Agent for both pipelines.
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("repo-cloner/{version} (repository-mirror)")
}
