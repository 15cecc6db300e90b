//! Static basic-auth credentials.

use std::fmt;

use reqwest::RequestBuilder;

use crate::error::ConfigError;

/// Username/password pair sent as `Authorization: Basic ...`.
///
/// The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Builds credentials from optional configuration values.
    ///
    /// Both halves absent means anonymous access. Exactly one half present is
    /// a configuration mistake rather than something to silently ignore.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::IncompleteCredentials`] when only one of the two
    /// values is set.
    pub fn from_parts(
        role: &'static str,
        username: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Self>, ConfigError> {
        match (username, password) {
            (Some(username), Some(password)) => Ok(Some(Self::new(username, password))),
            (None, None) => Ok(None),
            _ => Err(ConfigError::IncompleteCredentials { role }),
        }
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Decorates a request with the basic-auth header.
    #[must_use]
    pub fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.username, Some(&self.password))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Applies credentials to a request when configured.
#[must_use]
pub fn authorize(request: RequestBuilder, credentials: Option<&Credentials>) -> RequestBuilder {
    match credentials {
        Some(credentials) => credentials.apply(request),
        None => request,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use reqwest::header::AUTHORIZATION;

    use super::*;

    #[test]
    fn test_from_parts_both_present() {
        let creds = Credentials::from_parts("source", Some("user".into()), Some("pass".into()))
            .unwrap()
            .unwrap();
        assert_eq!(creds.username(), "user");
    }

    #[test]
    fn test_from_parts_both_absent_is_anonymous() {
        assert!(Credentials::from_parts("source", None, None).unwrap().is_none());
    }

    #[test]
    fn test_from_parts_half_pair_rejected() {
        let result = Credentials::from_parts("target", Some("user".into()), None);
        assert!(matches!(
            result,
            Err(ConfigError::IncompleteCredentials { role: "target" })
        ));

        let result = Credentials::from_parts("target", None, Some("pass".into()));
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("deployer", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("deployer"));
        assert!(!debug.contains("hunter2"), "password leaked: {debug}");
    }

    #[test]
    fn test_authorize_sets_basic_header() {
        let client = reqwest::Client::new();
        let creds = Credentials::new("user", "pass");
        let request = authorize(client.get("http://repo.example/"), Some(&creds))
            .build()
            .unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            "Basic dXNlcjpwYXNz"
        );
    }

    #[test]
    fn test_authorize_without_credentials_leaves_request_untouched() {
        let client = reqwest::Client::new();
        let request = authorize(client.get("http://repo.example/"), None)
            .build()
            .unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
    }
}
