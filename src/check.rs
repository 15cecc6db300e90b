//! Preflight connectivity checks against the source and target roots.
//!
//! Run before any traversal when requested, so that a wrong URL or rejected
//! credentials fail fast with a message naming the endpoint.

use reqwest::Client;
use tracing::{info, instrument};
use url::Url;

use crate::error::CheckError;
use crate::transport::{Credentials, TransferError, authorize};

/// Checks that the source root answers a GET with a 2xx status.
///
/// # Errors
///
/// Returns [`CheckError::SourceStatus`] for any other status and
/// [`CheckError::Transport`] if the request fails.
#[instrument(skip(client, credentials), fields(url = %root))]
pub async fn check_source(
    client: &Client,
    root: &Url,
    credentials: Option<&Credentials>,
) -> Result<(), CheckError> {
    let response = authorize(client.get(root.clone()), credentials)
        .send()
        .await
        .map_err(|e| TransferError::from_reqwest(root.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CheckError::SourceStatus {
            url: root.to_string(),
            status: status.as_u16(),
        });
    }
    info!("connection to source successful");
    Ok(())
}

/// Checks that the target root answers a HEAD with exactly 200.
///
/// # Errors
///
/// Returns [`CheckError::TargetStatus`] for any other status and
/// [`CheckError::Transport`] if the request fails.
#[instrument(skip(client, credentials), fields(url = %root))]
pub async fn check_target(
    client: &Client,
    root: &Url,
    credentials: Option<&Credentials>,
) -> Result<(), CheckError> {
    let response = authorize(client.head(root.clone()), credentials)
        .send()
        .await
        .map_err(|e| TransferError::from_reqwest(root.as_str(), e))?;

    let status = response.status().as_u16();
    if status != 200 {
        return Err(CheckError::TargetStatus {
            url: root.to_string(),
            status,
        });
    }
    info!("connection to target successful");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn root(server: &MockServer) -> Url {
        Url::parse(&format!("{}/repo/", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_check_source_ok_with_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repo/"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let credentials = Credentials::new("user", "pass");
        let result = check_source(&Client::new(), &root(&server), Some(&credentials)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_check_source_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = check_source(&Client::new(), &root(&server), None).await;
        assert!(matches!(result, Err(CheckError::SourceStatus { status: 401, .. })));
        assert!(result.unwrap_err().to_string().contains("/repo/"));
    }

    #[tokio::test]
    async fn test_check_target_requires_exactly_200() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = check_target(&Client::new(), &root(&server), None).await;
        assert!(matches!(result, Err(CheckError::TargetStatus { status: 204, .. })));
    }

    #[tokio::test]
    async fn test_check_target_ok() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/repo/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        assert!(check_target(&Client::new(), &root(&server), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_unreachable_is_transport_error() {
        let url = Url::parse("http://127.0.0.1:1/repo/").unwrap();
        let result = check_source(&Client::new(), &url, None).await;
        assert!(matches!(result, Err(CheckError::Transport(_))));
    }
}
