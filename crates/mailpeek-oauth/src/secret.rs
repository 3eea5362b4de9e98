//! Client secret file as downloaded from the Google Cloud console.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Application credentials for the authorization-code flow.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    /// OAuth client ID.
    pub client_id: String,
    /// OAuth client secret. Desktop clients still receive one.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Authorization endpoint.
    #[serde(default)]
    pub auth_uri: Option<String>,
    /// Token endpoint.
    #[serde(default)]
    pub token_uri: Option<String>,
    /// Registered redirect URIs.
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// The file wraps the credentials in an `installed` (desktop) or `web` object.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<ClientSecret>,
    web: Option<ClientSecret>,
}

impl ClientSecret {
    /// Parses a client secret document.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid, has neither an `installed`
    /// nor a `web` section, or has an empty client ID.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ClientSecretFile = serde_json::from_str(json)?;
        let secret = file.installed.or(file.web).ok_or_else(|| {
            Error::InvalidConfig("client secret has no \"installed\" or \"web\" section".into())
        })?;

        if secret.client_id.is_empty() {
            return Err(Error::InvalidConfig("client secret has an empty client_id".into()));
        }
        Ok(secret)
    }

    /// Reads and parses a client secret file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::file(path, e))?;
        Self::from_json(&json)
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
    fn test_installed_layout() {
        let json = r#"{
            "installed": {
                "client_id": "123.apps.googleusercontent.com",
                "project_id": "mailpeek",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "auth_provider_x509_cert_url": "https://www.googleapis.com/oauth2/v1/certs",
                "client_secret": "GOCSPX-abc",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let secret = ClientSecret::from_json(json).unwrap();
        assert_eq!(secret.client_id, "123.apps.googleusercontent.com");
        assert_eq!(secret.client_secret.as_deref(), Some("GOCSPX-abc"));
        assert_eq!(secret.redirect_uris, vec!["http://localhost".to_string()]);
    }

    #[test]
    fn test_web_layout() {
        let secret = ClientSecret::from_json(r#"{"web": {"client_id": "web-id"}}"#).unwrap();
        assert_eq!(secret.client_id, "web-id");
        assert!(secret.client_secret.is_none());
    }

    #[test]
    fn test_missing_section() {
        assert!(matches!(
            ClientSecret::from_json(r#"{"other": {}}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_empty_client_id() {
        assert!(matches!(
            ClientSecret::from_json(r#"{"installed": {"client_id": ""}}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ClientSecret::from_file(dir.path().join("credentials.json")),
            Err(Error::File { .. })
        ));
    }
}
