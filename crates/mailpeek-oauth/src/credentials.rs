//! Credential acquisition: stored token, refresh, or interactive consent.

use crate::error::Result;
use crate::flow::{AuthorizationCodeFlow, LoopbackReceiver, OAuthClient};
use crate::secret::ClientSecret;
use crate::token::{Token, TokenStore};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::Client;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Length of the random `state` parameter.
const STATE_LEN: usize = 32;

/// Produces a usable access token for the configured scopes.
///
/// Tokens are reused while valid, refreshed when expired, and obtained
/// through the browser otherwise. Every new token is written back to the
/// [`TokenStore`].
#[derive(Debug, Clone)]
pub struct CredentialProvider {
    store: TokenStore,
    client_secret_path: PathBuf,
    scopes: Vec<String>,
    http_client: Client,
    open_browser: bool,
}

impl CredentialProvider {
    /// Creates a provider backed by `store` and the client secret at
    /// `client_secret_path`.
    #[must_use]
    pub fn new(
        store: TokenStore,
        client_secret_path: impl Into<PathBuf>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            store,
            client_secret_path: client_secret_path.into(),
            scopes,
            http_client: Client::new(),
            open_browser: true,
        }
    }

    /// Uses a shared HTTP client for token requests.
    #[must_use]
    pub fn with_http_client(mut self, http_client: Client) -> Self {
        self.http_client = http_client;
        self
    }

    /// Controls whether the authorization URL is opened in a browser.
    /// The URL is always printed.
    #[must_use]
    pub const fn with_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Requested scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Path of the client secret file.
    #[must_use]
    pub fn client_secret_path(&self) -> &Path {
        &self.client_secret_path
    }

    /// Returns a valid token, refreshing or re-authorizing as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if interactive authorization is required and fails,
    /// or if the new token cannot be saved.
    pub async fn get_credentials(&self) -> Result<Token> {
        let stored = match self.store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable token store");
                None
            }
        };

        if let Some(token) = stored {
            if !token.covers_scopes(&self.scopes) {
                info!("Stored token does not cover the requested scopes");
            } else if token.is_valid() {
                debug!("Using stored token");
                return Ok(token);
            } else if token.refresh_token.is_some() {
                match self.refresh(&token).await {
                    Ok(token) => return Ok(token),
                    Err(e) => warn!(error = %e, "Token refresh failed"),
                }
            } else {
                debug!("Stored token expired without a refresh token");
            }
        }

        self.authorize().await
    }

    async fn refresh(&self, token: &Token) -> Result<Token> {
        let fresh = self.oauth_client()?.refresh_token(token).await?;
        self.store.save(&fresh)?;
        info!("Refreshed access token");
        Ok(fresh)
    }

    async fn authorize(&self) -> Result<Token> {
        let client = self.oauth_client()?;
        let receiver = LoopbackReceiver::bind().await?;
        let flow =
            AuthorizationCodeFlow::new(client.with_redirect_uri(receiver.redirect_uri())).with_pkce();

        let state = random_state();
        let url = flow.authorization_url(Some(self.scopes.as_slice()), Some(state.as_str()))?;

        eprintln!("Open this URL in your browser to authorize access:\n\n{url}\n");
        if self.open_browser
            && let Err(e) = opener::open(url.as_str())
        {
            warn!(error = %e, "Could not open browser");
        }

        let code = receiver.receive(&state).await?;
        let token = flow.exchange_code(&code, None).await?;
        self.store.save(&token)?;
        info!(path = %self.store.path().display(), "Saved new token");
        Ok(token)
    }

    fn oauth_client(&self) -> Result<OAuthClient> {
        let secret = ClientSecret::from_file(&self.client_secret_path)?;
        Ok(OAuthClient::from_client_secret(&secret)?.with_http_client(self.http_client.clone()))
    }
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
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
    use crate::provider::GMAIL_READONLY_SCOPE;
    use chrono::{Duration, Utc};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn scopes() -> Vec<String> {
        vec![GMAIL_READONLY_SCOPE.to_string()]
    }

    fn write_secret(dir: &Path, token_uri: &str) -> PathBuf {
        let path = dir.join("credentials.json");
        let json = serde_json::json!({
            "installed": {
                "client_id": "cid",
                "client_secret": "shh",
                "token_uri": token_uri
            }
        });
        std::fs::write(&path, json.to_string()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_valid_token_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let token = Token::new("stored", "Bearer")
            .with_expires_at(Utc::now() + Duration::hours(1))
            .with_scope(GMAIL_READONLY_SCOPE);
        store.save(&token).unwrap();

        // No client secret on disk: any network path would fail
        let provider = CredentialProvider::new(store, dir.path().join("missing.json"), scopes());
        let got = provider.get_credentials().await.unwrap();
        assert_eq!(got.access_token, "stored");
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_saved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("refresh_token=1%2F%2Frefresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.new",
                "expires_in": 3599,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let secret = write_secret(dir.path(), &format!("{}/token", server.uri()));
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(
                &Token::new("ya29.old", "Bearer")
                    .with_expires_at(Utc::now() - Duration::hours(1))
                    .with_refresh_token("1//refresh")
                    .with_scope(GMAIL_READONLY_SCOPE),
            )
            .unwrap();

        let provider = CredentialProvider::new(store.clone(), secret, scopes()).with_browser(false);
        let got = provider.get_credentials().await.unwrap();
        assert_eq!(got.access_token, "ya29.new");
        assert_eq!(got.refresh_token.as_deref(), Some("1//refresh"));

        let saved = store.load().unwrap().unwrap();
        assert_eq!(saved.access_token, "ya29.new");
        assert!(saved.is_valid());
    }

    #[tokio::test]
    async fn test_missing_secret_is_fatal_without_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let provider = CredentialProvider::new(store, dir.path().join("missing.json"), scopes())
            .with_browser(false);

        let err = provider.get_credentials().await.unwrap_err();
        assert!(matches!(err, Error::File { .. }));
    }

    #[tokio::test]
    async fn test_failed_refresh_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store
            .save(
                &Token::new("old", "Bearer")
                    .with_expires_at(Utc::now() - Duration::hours(1))
                    .with_refresh_token("r"),
            )
            .unwrap();

        // Refresh fails on the missing secret, then interactive auth fails the same way
        let provider = CredentialProvider::new(store, dir.path().join("missing.json"), scopes())
            .with_browser(false);
        let err = provider.get_credentials().await.unwrap_err();
        assert!(matches!(err, Error::File { .. }));
    }

    #[test]
    fn test_random_state() {
        let a = random_state();
        assert_eq!(a.len(), STATE_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, random_state());
    }
}
