//! Runtime configuration.
//!
//! Sources, later ones winning: built-in defaults, the JSON config file,
//! `MAILPEEK_*` environment variables, and the first command-line argument
//! as the search query.

use anyhow::{Context, Result, bail};
use mailpeek_gmail::DEFAULT_MAX_MESSAGES;
use mailpeek_oauth::GMAIL_READONLY_SCOPE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "mailpeek";

/// Path of the config file, overriding `<config dir>/mailpeek/config.json`.
pub const CONFIG_ENV: &str = "MAILPEEK_CONFIG";
/// Gmail search query.
pub const QUERY_ENV: &str = "MAILPEEK_QUERY";
/// Token store path.
pub const TOKEN_PATH_ENV: &str = "MAILPEEK_TOKEN_PATH";
/// Client secret path.
pub const CLIENT_SECRET_PATH_ENV: &str = "MAILPEEK_CLIENT_SECRET_PATH";
/// Maximum number of messages to fetch.
pub const MAX_MESSAGES_ENV: &str = "MAILPEEK_MAX_MESSAGES";

/// Settings for one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// OAuth scopes to request.
    pub scopes: Vec<String>,
    /// Gmail search query, e.g. `from:(alerts@example.com)`. Empty matches everything.
    pub filter_query: String,
    /// Token store file.
    pub token_path: PathBuf,
    /// Client secret file downloaded from the Google Cloud console.
    pub client_secret_path: PathBuf,
    /// Maximum number of messages to fetch.
    pub max_messages: usize,
}

impl Default for Config {
    fn default() -> Self {
        let dir = app_config_dir();
        Self {
            scopes: vec![GMAIL_READONLY_SCOPE.to_string()],
            filter_query: String::new(),
            token_path: dir.join("token.json"),
            client_secret_path: dir.join("credentials.json"),
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }
}

impl Config {
    /// Loads the configuration from the process environment and `args`
    /// (without the program name).
    ///
    /// # Errors
    ///
    /// Returns an error if the config file or an override is invalid.
    pub fn load(args: impl IntoIterator<Item = String>) -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok(), args)
    }

    /// Like [`load`](Self::load), reading variables through `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file or an override is invalid.
    pub fn load_with(
        env: impl Fn(&str) -> Option<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Result<Self> {
        let mut config = match env(CONFIG_ENV) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => {
                let path = app_config_dir().join("config.json");
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    debug!("No config file at {}", path.display());
                    Self::default()
                }
            }
        };

        config.apply_env(env)?;
        if let Some(query) = args.into_iter().next() {
            config.filter_query = query;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON config file. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(query) = env(QUERY_ENV) {
            self.filter_query = query;
        }
        if let Some(path) = env(TOKEN_PATH_ENV) {
            self.token_path = path.into();
        }
        if let Some(path) = env(CLIENT_SECRET_PATH_ENV) {
            self.client_secret_path = path.into();
        }
        if let Some(max) = env(MAX_MESSAGES_ENV) {
            self.max_messages = max
                .trim()
                .parse()
                .with_context(|| format!("{MAX_MESSAGES_ENV} must be a number, got {max:?}"))?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.scopes.is_empty() {
            bail!("At least one OAuth scope is required");
        }
        if self.max_messages == 0 {
            bail!("max_messages must be greater than zero");
        }
        Ok(())
    }
}

fn app_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
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
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(json: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, json).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.scopes, vec![GMAIL_READONLY_SCOPE.to_string()]);
        assert_eq!(config.filter_query, "");
        assert_eq!(config.max_messages, 100);
        assert!(config.token_path.ends_with("mailpeek/token.json"));
        assert!(config.client_secret_path.ends_with("mailpeek/credentials.json"));
    }

    #[test]
    fn test_file_overrides_defaults() {
        let (_dir, path) = write_config(
            r#"{"filter_query": "from:(alerts@example.com)", "token_path": "/tmp/t.json"}"#,
        );
        let config = Config::load_with(env_from(&[(CONFIG_ENV, path.as_str())]), Vec::new()).unwrap();

        assert_eq!(config.filter_query, "from:(alerts@example.com)");
        assert_eq!(config.token_path, PathBuf::from("/tmp/t.json"));
        assert_eq!(config.max_messages, DEFAULT_MAX_MESSAGES);
    }

    #[test]
    fn test_env_overrides_file() {
        let (_dir, path) = write_config(r#"{"filter_query": "from:file", "max_messages": 5}"#);
        let env = env_from(&[
            (CONFIG_ENV, path.as_str()),
            (QUERY_ENV, "from:env"),
            (CLIENT_SECRET_PATH_ENV, "/secrets/client.json"),
            (MAX_MESSAGES_ENV, " 250 "),
        ]);
        let config = Config::load_with(env, Vec::new()).unwrap();

        assert_eq!(config.filter_query, "from:env");
        assert_eq!(config.client_secret_path, PathBuf::from("/secrets/client.json"));
        assert_eq!(config.max_messages, 250);
    }

    #[test]
    fn test_argument_overrides_env() {
        let (_dir, path) = write_config("{}");
        let env = env_from(&[(CONFIG_ENV, path.as_str()), (QUERY_ENV, "from:env")]);
        let config =
            Config::load_with(env, vec!["is:unread".to_string(), "ignored".to_string()]).unwrap();
        assert_eq!(config.filter_query, "is:unread");
    }

    #[test]
    fn test_invalid_max_messages() {
        let (_dir, path) = write_config("{}");
        let env = env_from(&[(CONFIG_ENV, path.as_str()), (MAX_MESSAGES_ENV, "lots")]);
        assert!(Config::load_with(env, Vec::new()).is_err());

        let (_dir, path) = write_config(r#"{"max_messages": 0}"#);
        assert!(Config::load_with(env_from(&[(CONFIG_ENV, path.as_str())]), Vec::new()).is_err());
    }

    #[test]
    fn test_explicit_config_must_exist() {
        let env = env_from(&[(CONFIG_ENV, "/nonexistent/mailpeek.json")]);
        let err = Config::load_with(env, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_config() {
        let (_dir, path) = write_config("{not json");
        assert!(Config::load_with(env_from(&[(CONFIG_ENV, path.as_str())]), Vec::new()).is_err());
    }
}
