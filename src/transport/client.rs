//! HTTP client construction from transport settings.

use std::time::Duration;

use reqwest::{Client, Proxy};
use tracing::{debug, instrument};

use super::constants::{CONNECT_TIMEOUT_SECS, DOWNLOAD_TIMEOUT_SECS, default_user_agent};
use super::credentials::Credentials;
use crate::error::ConfigError;

/// Time limit applied to every request of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTimeout {
    /// Bounds the whole exchange, body transfer included.
    Total(Duration),
    /// Fires once the connection has been silent this long. A transfer that
    /// keeps receiving data may run longer.
    Idle(Duration),
}

impl RequestTimeout {
    /// Returns the configured limit.
    #[must_use]
    pub fn duration(self) -> Duration {
        match self {
            Self::Total(limit) | Self::Idle(limit) => limit,
        }
    }
}

/// Per-pipeline transport settings, fixed before a run starts.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Basic-auth credentials, if the repository needs them.
    pub credentials: Option<Credentials>,
    /// Explicit proxy URL. `None` keeps reqwest's system/env proxy detection.
    pub proxy: Option<String>,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Request time limit.
    pub request_timeout: RequestTimeout,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            credentials: None,
            proxy: None,
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: RequestTimeout::Idle(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS)),
        }
    }
}

impl TransportConfig {
    /// Creates settings with default timeouts and the given credentials.
    #[must_use]
    pub fn new(credentials: Option<Credentials>) -> Self {
        Self {
            credentials,
            ..Self::default()
        }
    }

    /// Sets an explicit proxy.
    #[must_use]
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    /// Sets the connect timeout and the request time limit.
    #[must_use]
    pub fn with_timeouts(mut self, connect: Duration, request: RequestTimeout) -> Self {
        self.connect_timeout = connect;
        self.request_timeout = request;
        self
    }
}

/// Builds a pooled HTTP client for one pipeline.
///
/// Credentials are not baked into the client; they are applied per request
/// with [`super::authorize`] so a redirect to another host never inherits
/// them through a default header.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidProxy`] for an unusable proxy URL and
/// [`ConfigError::HttpClient`] if the client cannot be built.
#[instrument(
    level = "debug",
    skip(config),
    fields(proxy = config.proxy.as_deref().unwrap_or("system"))
)]
pub fn build_client(config: &TransportConfig) -> Result<Client, ConfigError> {
    let mut builder = Client::builder()
        .connect_timeout(config.connect_timeout)
        .gzip(true)
        .user_agent(default_user_agent());
    builder = match config.request_timeout {
        RequestTimeout::Total(limit) => builder.timeout(limit),
        RequestTimeout::Idle(limit) => builder.read_timeout(limit),
    };

    if let Some(proxy) = &config.proxy {
        let resolved = Proxy::all(proxy).map_err(|source| ConfigError::InvalidProxy {
            proxy: proxy.clone(),
            source,
        })?;
        builder = builder.proxy(resolved);
    }

    debug!(
        connect_timeout_secs = config.connect_timeout.as_secs(),
        request_timeout_secs = config.request_timeout.duration().as_secs(),
        idle_timeout = matches!(config.request_timeout, RequestTimeout::Idle(_)),
        authenticated = config.credentials.is_some(),
        "building HTTP client"
    );

    builder.build().map_err(ConfigError::HttpClient)
}
