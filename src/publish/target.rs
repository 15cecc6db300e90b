//! Access to the target repository: existence probes and uploads.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Client, header};
use tokio::fs::File;
use tracing::{debug, instrument};
use url::Url;

use crate::transport::{Credentials, TransferError, authorize, truncate_body};

/// What a probe response says about the remote object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The object exists; its body must not be sent again.
    Present,
    /// The object does not exist yet.
    Absent,
    /// Neither; the status is reported as a failure.
    Unexpected(u16),
}

impl ProbeStatus {
    /// Classifies a probe response status.
    ///
    /// 2xx and 3xx mean present, 404 and 410 mean absent. Anything else
    /// (401, 403, 5xx) cannot be trusted either way.
    #[must_use]
    pub fn from_status(status: u16) -> Self {
        match status {
            200..=399 => Self::Present,
            404 | 410 => Self::Absent,
            other => Self::Unexpected(other),
        }
    }
}

/// Response to an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body, truncated for logging.
    pub body: String,
}

impl UploadResponse {
    /// Returns true for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Target capability consumed by the publisher.
#[async_trait]
pub trait PublishTarget: Send + Sync {
    /// Issues a header-only request and returns the status code.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on transport faults only; every status is
    /// returned as a value.
    async fn probe(&self, url: &Url) -> Result<u16, TransferError>;

    /// Uploads the file at `path` to `url` with PUT semantics.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::Io`] if the file cannot be opened and other
    /// [`TransferError`] variants on transport faults. Non-2xx statuses are
    /// returned in the [`UploadResponse`].
    async fn upload(&self, url: &Url, path: &Path) -> Result<UploadResponse, TransferError>;
}

/// HTTP implementation of [`PublishTarget`].
#[derive(Debug, Clone)]
pub struct HttpTarget {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpTarget {
    /// Creates a target over a prepared client.
    #[must_use]
    pub fn new(client: Client, credentials: Option<Credentials>) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl PublishTarget for HttpTarget {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn probe(&self, url: &Url) -> Result<u16, TransferError> {
        let request = authorize(self.client.head(url.clone()), self.credentials.as_ref());
        let response = request
            .send()
            .await
            .map_err(|e| TransferError::from_reqwest(url.as_str(), e))?;
        let status = response.status().as_u16();
        debug!(status, "probe answered");
        Ok(status)
    }

    #[instrument(level = "debug", skip(self), fields(url = %url, path = %path.display()))]
    async fn upload(&self, url: &Url, path: &Path) -> Result<UploadResponse, TransferError> {
        let file = File::open(path)
            .await
            .map_err(|e| TransferError::io(path, e))?;
        let length = file
            .metadata()
            .await
            .map_err(|e| TransferError::io(path, e))?
            .len();

        let request = self
            .client
            .put(url.clone())
            .header(header::CONTENT_LENGTH, length)
            .body(file);
        let response = authorize(request, self.credentials.as_ref())
            .send()
            .await
            .map_err(|e| TransferError::from_reqwest(url.as_str(), e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map(|b| truncate_body(&b))
            .unwrap_or_default();
        Ok(UploadResponse { status, body })
    }
}
