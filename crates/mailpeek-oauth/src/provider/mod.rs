//! `OAuth2` provider configurations.

use crate::error::{Error, Result};
use crate::secret::ClientSecret;
use url::Url;

/// Read-only Gmail scope.
pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// `OAuth2` provider configuration.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "Google").
    pub name: String,
    /// Authorization endpoint URL.
    pub auth_url: Url,
    /// Token endpoint URL.
    pub token_url: Url,
    /// Default scopes.
    pub default_scopes: Vec<String>,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if URLs are invalid.
    pub fn new(
        name: impl Into<String>,
        auth_url: impl AsRef<str>,
        token_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            auth_url: Url::parse(auth_url.as_ref())?,
            token_url: Url::parse(token_url.as_ref())?,
            default_scopes: Vec::new(),
        })
    }

    /// Sets the default scopes.
    #[must_use]
    pub fn with_default_scopes(mut self, scopes: Vec<String>) -> Self {
        self.default_scopes = scopes;
        self
    }

    /// Google `OAuth2` provider configuration.
    ///
    /// Scopes:
    /// - `https://www.googleapis.com/auth/gmail.readonly` - Read-only mailbox access
    ///
    /// # Errors
    ///
    /// Returns an error if URL parsing fails.
    pub fn google() -> Result<Self> {
        Ok(Self::new("Google", GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL)?
            .with_default_scopes(vec![GMAIL_READONLY_SCOPE.to_string()]))
    }

    /// Google provider using the endpoints listed in a downloaded client secret.
    ///
    /// Endpoints missing from the file fall back to Google's defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid.
    pub fn from_client_secret(secret: &ClientSecret) -> Result<Self> {
        let auth_url = secret.auth_uri.as_deref().unwrap_or(GOOGLE_AUTH_URL);
        let token_url = secret.token_uri.as_deref().unwrap_or(GOOGLE_TOKEN_URL);
        Ok(Self::new("Google", auth_url, token_url)?
            .with_default_scopes(vec![GMAIL_READONLY_SCOPE.to_string()]))
    }

    /// Validates that required URLs are set.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.auth_url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "auth_url must be http(s): {}",
                self.auth_url
            )));
        }
        if !matches!(self.token_url.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "token_url must be http(s): {}",
                self.token_url
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_google_provider() {
        let provider = Provider::google().unwrap();
        assert_eq!(provider.name, "Google");
        assert_eq!(provider.default_scopes, vec![GMAIL_READONLY_SCOPE.to_string()]);
        provider.validate().unwrap();
    }

    #[test]
    fn test_from_client_secret() {
        let secret = ClientSecret::from_json(
            r#"{"installed": {"client_id": "id", "token_uri": "http://127.0.0.1:9/token"}}"#,
        )
        .unwrap();
        let provider = Provider::from_client_secret(&secret).unwrap();
        assert_eq!(provider.token_url.as_str(), "http://127.0.0.1:9/token");
        assert_eq!(provider.auth_url.as_str(), GOOGLE_AUTH_URL);
        provider.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_non_http() {
        let provider = Provider::new("Custom", "ftp://auth.example.com/", "https://auth.example.com/token").unwrap();
        assert!(matches!(provider.validate(), Err(Error::InvalidConfig(_))));
    }
}
