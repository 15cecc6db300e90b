//! Access to the source repository: index pages and artifact bodies.
//!
//! The crawler only needs two things from the source: the absolute URLs an
//! index page links to, and a byte stream for an artifact. [`IndexSource`]
//! captures exactly that, and [`HttpSource`] implements it with a plain GET
//! plus an `href` extraction pass over the returned markup.

use std::pin::Pin;
use std::sync::LazyLock;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use regex::Regex;
use reqwest::Client;
use tracing::{debug, instrument, trace};
use url::Url;

use crate::transport::{Credentials, TransferError, authorize, truncate_body};

/// Stream of artifact body chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransferError>> + Send>>;

/// Anchor `href` attribute in double quotes, single quotes, or unquoted.
#[allow(clippy::expect_used)]
static HREF_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\s[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#)
        .expect("href regex is valid") // Static pattern, safe to panic
});

/// Source capability consumed by the crawler.
#[async_trait]
pub trait IndexSource: Send + Sync {
    /// Fetches an index page and returns its outbound links as absolute URLs.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on transport faults or a non-2xx status.
    async fn list_links(&self, page: &Url) -> Result<Vec<Url>, TransferError>;

    /// Opens an artifact for streaming.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError`] on transport faults or a non-2xx status.
    async fn open(&self, url: &Url) -> Result<ByteStream, TransferError>;
}

/// HTTP implementation of [`IndexSource`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    credentials: Option<Credentials>,
}

impl HttpSource {
    /// Creates a source over a prepared client.
    #[must_use]
    pub fn new(client: Client, credentials: Option<Credentials>) -> Self {
        Self {
            client,
            credentials,
        }
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, TransferError> {
        let request = authorize(self.client.get(url.clone()), self.credentials.as_ref());
        let response = request
            .send()
            .await
            .map_err(|e| TransferError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().map(|b| truncate_body(&b));
            return Err(TransferError::http_status(url.as_str(), status.as_u16(), body));
        }
        Ok(response)
    }
}

#[async_trait]
impl IndexSource for HttpSource {
    #[instrument(skip(self), fields(page = %page))]
    async fn list_links(&self, page: &Url) -> Result<Vec<Url>, TransferError> {
        let response = self.get(page).await?;
        // Relative links resolve against the final URL after redirects.
        let base = response.url().clone();
        let html = response
            .text()
            .await
            .map_err(|e| TransferError::from_reqwest(page.as_str(), e))?;

        let links = extract_links(&base, &html);
        debug!(count = links.len(), "extracted links");
        Ok(links)
    }

    #[instrument(skip(self), fields(url = %url))]
    async fn open(&self, url: &Url) -> Result<ByteStream, TransferError> {
        let response = self.get(url).await?;
        let owned_url = url.to_string();
        let stream = response
            .bytes_stream()
            .map(move |chunk| chunk.map_err(|e| TransferError::from_reqwest(owned_url.clone(), e)));
        Ok(Box::pin(stream))
    }
}

/// Extracts anchor targets from markup and resolves them against `base`.
///
/// Only http(s) targets are returned; `mailto:`, `javascript:` and fragment-only
/// anchors are dropped.
#[must_use]
pub fn extract_links(base: &Url, html: &str) -> Vec<Url> {
    HREF_PATTERN
        .captures_iter(html)
        .filter_map(|captures| {
            captures
                .get(1)
                .or_else(|| captures.get(2))
                .or_else(|| captures.get(3))
        })
        .map(|href| unescape_html(href.as_str().trim()))
        .filter(|href| !href.is_empty() && !href.starts_with('#'))
        .filter_map(|href| match base.join(&href) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            Ok(url) => {
                trace!(link = %url, "skipping non-http link");
                None
            }
            Err(e) => {
                trace!(href = %href, error = %e, "skipping unparseable link");
                None
            }
        })
        .collect()
}

fn unescape_html(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
