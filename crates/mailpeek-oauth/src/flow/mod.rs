//! `OAuth2` authorization flows.

mod code;
mod loopback;
mod pkce;

pub use code::AuthorizationCodeFlow;
pub use loopback::{LoopbackReceiver, RedirectParams, parse_redirect_request};
pub use pkce::PkceChallenge;

use crate::error::Result;
use crate::provider::Provider;
use crate::secret::ClientSecret;
use crate::token::{ErrorResponse, Token, TokenResponse};
use reqwest::Client;
use std::collections::HashMap;

/// Common `OAuth2` client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    /// Client ID from provider.
    pub client_id: String,
    /// Client secret (optional for public clients).
    pub client_secret: Option<String>,
    /// Redirect URI for authorization code flow.
    pub redirect_uri: Option<String>,
    /// Provider configuration.
    pub provider: Provider,
    /// HTTP client.
    http_client: Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    #[must_use]
    pub fn new(client_id: impl Into<String>, provider: Provider) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: None,
            redirect_uri: None,
            provider,
            http_client: Client::new(),
        }
    }

    /// Creates a client from a downloaded client secret.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoints in the secret are invalid.
    pub fn from_client_secret(secret: &ClientSecret) -> Result<Self> {
        let provider = Provider::from_client_secret(secret)?;
        provider.validate()?;

        let mut client = Self::new(&secret.client_id, provider);
        client.client_secret.clone_from(&secret.client_secret);
        Ok(client)
    }

    /// Sets the client secret.
    #[must_use]
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Sets the redirect URI.
    #[must_use]
    pub fn with_redirect_uri(mut self, uri: impl Into<String>) -> Self {
        self.redirect_uri = Some(uri.into());
        self
    }

    /// Uses a shared HTTP client instead of a private one.
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Refreshes an access token using a refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh fails or if the token has no refresh token.
    pub async fn refresh_token(&self, token: &Token) -> Result<Token> {
        let refresh_token = token.refresh_token()?;

        let mut params = HashMap::new();
        params.insert("grant_type", "refresh_token");
        params.insert("refresh_token", refresh_token);
        params.insert("client_id", &self.client_id);

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        let mut new_token = self.request_token(&params).await?;

        // Google does not rotate refresh tokens; keep the old one
        if new_token.refresh_token.is_none() {
            new_token.refresh_token.clone_from(&token.refresh_token);
        }
        if new_token.scope.is_none() {
            new_token.scope.clone_from(&token.scope);
        }

        Ok(new_token)
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub(crate) async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: Option<&str>,
        code_verifier: Option<&str>,
    ) -> Result<Token> {
        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("client_id", &self.client_id);

        if let Some(uri) = redirect_uri.or(self.redirect_uri.as_deref()) {
            params.insert("redirect_uri", uri);
        }

        if let Some(secret) = &self.client_secret {
            params.insert("client_secret", secret);
        }

        if let Some(verifier) = code_verifier {
            params.insert("code_verifier", verifier);
        }

        self.request_token(&params).await
    }

    async fn request_token(&self, params: &HashMap<&str, &str>) -> Result<Token> {
        let response = self
            .http_client
            .post(self.provider.token_url.clone())
            .form(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let error: ErrorResponse = response.json().await?;
            return Err(error.into_error());
        }

        let token_response: TokenResponse = response.json().await?;
        Token::from_response(token_response)
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
    use crate::error::Error;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OAuthClient {
        let provider = Provider::new(
            "Google",
            format!("{}/auth", server.uri()),
            format!("{}/token", server.uri()),
        )
        .unwrap();
        OAuthClient::new("test_client_id", provider).with_client_secret("secret")
    }

    #[test]
    fn test_oauth_client_creation() {
        let provider = Provider::google().unwrap();
        let client = OAuthClient::new("test_client_id", provider);
        assert_eq!(client.client_id, "test_client_id");
        assert!(client.client_secret.is_none());
    }

    #[test]
    fn test_oauth_client_from_secret() {
        let secret = ClientSecret::from_json(
            r#"{"installed": {"client_id": "cid", "client_secret": "shh"}}"#,
        )
        .unwrap();
        let client = OAuthClient::from_client_secret(&secret)
            .unwrap()
            .with_redirect_uri("http://127.0.0.1:8080");

        assert_eq!(client.client_id, "cid");
        assert_eq!(client.client_secret.as_deref(), Some("shh"));
        assert_eq!(client.redirect_uri.as_deref(), Some("http://127.0.0.1:8080"));
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=old-refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "new-access",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .expect(1)
            .mount(&server)
            .await;

        let old = Token::new("old-access", "Bearer")
            .with_refresh_token("old-refresh")
            .with_scope("https://www.googleapis.com/auth/gmail.readonly");
        let token = client_for(&server).refresh_token(&old).await.unwrap();

        assert_eq!(token.access_token, "new-access");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert_eq!(token.scope, old.scope);
        assert!(token.is_valid());
    }

    #[tokio::test]
    async fn test_refresh_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Token has been expired or revoked."
            })))
            .mount(&server)
            .await;

        let old = Token::new("a", "Bearer").with_refresh_token("revoked");
        let err = client_for(&server).refresh_token(&old).await.unwrap_err();
        assert!(matches!(err, Error::OAuth { ref error, .. } if error == "invalid_grant"));
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token() {
        let client = OAuthClient::new("id", Provider::google().unwrap());
        let err = client.refresh_token(&Token::new("a", "Bearer")).await.unwrap_err();
        assert!(matches!(err, Error::NoRefreshToken));
    }
}
