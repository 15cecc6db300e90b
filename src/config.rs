//! Immutable run configuration and its validation.
//!
//! Everything here is established once before a run starts and never
//! mutated afterwards. Validation happens up front so that a malformed root
//! URL or half a credential pair fails before any request is sent.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;
use crate::mirror::{CrawlPolicy, as_directory};
use crate::pool::validate_concurrency;
use crate::publish::PublishPolicy;
use crate::transport::Credentials;
use crate::transport::constants::{CONNECT_TIMEOUT_SECS, DOWNLOAD_TIMEOUT_SECS, UPLOAD_TIMEOUT_SECS};

/// Default local mirror directory.
pub const DEFAULT_MIRROR_PATH: &str = "./mirror/";

/// Default action list.
pub const DEFAULT_ACTIONS: &str = "mirror,publish";

/// Which pipelines to run. Mirroring always runs before publishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actions {
    /// Copy the source tree into the mirror directory.
    pub mirror: bool,
    /// Upload the mirror directory to the target.
    pub publish: bool,
}

impl Default for Actions {
    fn default() -> Self {
        Self {
            mirror: true,
            publish: true,
        }
    }
}

impl Actions {
    /// Parses a comma separated list such as `mirror,publish`.
    ///
    /// Entries are trimmed and case-insensitive; repeats are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAction`] for anything other than
    /// `mirror` or `publish`, and [`ConfigError::NoActions`] for an empty list.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut actions = Self {
            mirror: false,
            publish: false,
        };
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            match entry.to_lowercase().as_str() {
                "mirror" => actions.mirror = true,
                "publish" => actions.publish = true,
                _ => return Err(ConfigError::UnknownAction(entry.to_string())),
            }
        }
        if !actions.mirror && !actions.publish {
            return Err(ConfigError::NoActions);
        }
        Ok(actions)
    }
}

impl fmt::Display for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.mirror, self.publish) {
            (true, true) => f.write_str("mirror,publish"),
            (true, false) => f.write_str("mirror"),
            (false, true) => f.write_str("publish"),
            (false, false) => f.write_str("none"),
        }
    }
}

/// A remote repository root plus its credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Root URL, always ending with `/`.
    pub root_url: Url,
    /// Optional basic-auth credentials.
    pub credentials: Option<Credentials>,
}

impl Endpoint {
    /// Creates an endpoint from raw configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRootUrl`] or
    /// [`ConfigError::IncompleteCredentials`].
    pub fn from_parts(
        role: &'static str,
        root_url: &str,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            root_url: parse_root_url(role, root_url)?,
            credentials: Credentials::from_parts(role, username, password)?,
        })
    }
}

/// Parses a root URL and normalizes it to a directory URL.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidRootUrl`] if the value does not parse, is not
/// http(s), or has no host.
pub fn parse_root_url(role: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidRootUrl {
        role,
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".into()));
    }
    Ok(as_directory(&url))
}

/// Request timeouts for both pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// TCP/TLS connect timeout.
    pub connect: Duration,
    /// Idle timeout for index pages and downloads. A download that keeps
    /// streaming is never cut off by it.
    pub download: Duration,
    /// Whole-request timeout for probes and uploads.
    pub upload: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            download: Duration::from_secs(DOWNLOAD_TIMEOUT_SECS),
            upload: Duration::from_secs(UPLOAD_TIMEOUT_SECS),
        }
    }
}

/// Everything a run needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Pipelines to run.
    pub actions: Actions,
    /// Source repository; required for `mirror`.
    pub source: Option<Endpoint>,
    /// Target repository; required for `publish`.
    pub target: Option<Endpoint>,
    /// Local mirror root.
    pub mirror_path: PathBuf,
    /// Crawl settings.
    pub crawl: CrawlPolicy,
    /// Publish settings.
    pub publish: PublishPolicy,
    /// Explicit proxy for both pipelines.
    pub proxy: Option<String>,
    /// Request timeouts.
    pub timeouts: Timeouts,
    /// Run the preflight checks before any traversal.
    pub check: bool,
}

impl RunConfig {
    /// Creates a configuration with default policies.
    #[must_use]
    pub fn new(actions: Actions, source: Option<Endpoint>, target: Option<Endpoint>) -> Self {
        Self {
            actions,
            source,
            target,
            mirror_path: PathBuf::from(DEFAULT_MIRROR_PATH),
            crawl: CrawlPolicy::default(),
            publish: PublishPolicy::default(),
            proxy: None,
            timeouts: Timeouts::default(),
            check: false,
        }
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRootUrl`] if a requested action lacks
    /// its endpoint and [`ConfigError::InvalidConcurrency`] for pool sizes
    /// outside `1..=100`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.actions.mirror && !self.actions.publish {
            return Err(ConfigError::NoActions);
        }
        if self.actions.mirror {
            if self.source.is_none() {
                return Err(ConfigError::MissingRootUrl {
                    action: "mirror",
                    role: "source",
                });
            }
            validate_concurrency("crawl", self.crawl.concurrency)?;
        }
        if self.actions.publish {
            if self.target.is_none() {
                return Err(ConfigError::MissingRootUrl {
                    action: "publish",
                    role: "target",
                });
            }
            validate_concurrency("publish", self.publish.concurrency)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn endpoint(url: &str) -> Endpoint {
        Endpoint::from_parts("source", url, None, None).unwrap()
    }

    #[test]
    fn test_actions_parse_defaults_and_subsets() {
        assert_eq!(Actions::parse(DEFAULT_ACTIONS).unwrap(), Actions::default());
        let only_publish = Actions::parse(" Publish ").unwrap();
        assert!(!only_publish.mirror);
        assert!(only_publish.publish);
        assert_eq!(only_publish.to_string(), "publish");
    }

    #[test]
    fn test_actions_parse_rejects_unknown_and_empty() {
        assert!(matches!(
            Actions::parse("mirror,sync"),
            Err(ConfigError::UnknownAction(a)) if a == "sync"
        ));
        assert!(matches!(Actions::parse(" , "), Err(ConfigError::NoActions)));
    }

    #[test]
    fn test_parse_root_url_appends_trailing_slash() {
        let url = parse_root_url("target", "https://t.example/releases").unwrap();
        assert_eq!(url.as_str(), "https://t.example/releases/");
    }

    #[test]
    fn test_parse_root_url_rejects_bad_values() {
        assert!(matches!(
            parse_root_url("source", "ftp://repo.example/"),
            Err(ConfigError::InvalidRootUrl { role: "source", .. })
        ));
        assert!(parse_root_url("source", "not a url").is_err());
        assert!(parse_root_url("source", "").is_err());
    }

    #[test]
    fn test_endpoint_rejects_half_credentials() {
        let result = Endpoint::from_parts("target", "https://t.example/", Some("u".into()), None);
        assert!(matches!(
            result,
            Err(ConfigError::IncompleteCredentials { role: "target" })
        ));
    }

    #[test]
    fn test_validate_requires_endpoints_for_actions() {
        let config = RunConfig::new(Actions::default(), Some(endpoint("https://s.example/")), None);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRootUrl { action: "publish", .. })
        ));

        let mirror_only = RunConfig::new(
            Actions::parse("mirror").unwrap(),
            Some(endpoint("https://s.example/")),
            None,
        );
        assert!(mirror_only.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let mut config = RunConfig::new(
            Actions::parse("mirror").unwrap(),
            Some(endpoint("https://s.example/")),
            None,
        );
        config.crawl.concurrency = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidConcurrency { pipeline: "crawl", .. })
        ));
    }

    #[test]
    fn test_default_timeouts_upload_longer_than_download() {
        let timeouts = Timeouts::default();
        assert!(timeouts.upload > timeouts.download);
        assert_eq!(timeouts.connect, Duration::from_secs(30));
    }
}
