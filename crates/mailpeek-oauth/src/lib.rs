//! # mailpeek-oauth
//!
//! Google `OAuth2` credentials for command-line tools.
//!
//! ## Features
//!
//! - **Authorization Code Flow** with PKCE and a loopback redirect listener
//! - **Token management**: expiry checks, refresh, scope coverage
//! - **Token store**: a JSON file with owner-only permissions
//! - **Client secrets**: Google's downloaded `credentials.json` format
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpeek_oauth::{CredentialProvider, GMAIL_READONLY_SCOPE, TokenStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = CredentialProvider::new(
//!         TokenStore::new("token.json"),
//!         "credentials.json",
//!         vec![GMAIL_READONLY_SCOPE.to_string()],
//!     );
//!
//!     // Reuses, refreshes, or opens the browser for consent
//!     let token = provider.get_credentials().await?;
//!     println!("Access token expires at {:?}", token.expires_at);
//!     Ok(())
//! }
//! ```
//!
//! ### Driving the flow by hand
//!
//! ```ignore
//! use mailpeek_oauth::{AuthorizationCodeFlow, ClientSecret, LoopbackReceiver, OAuthClient};
//!
//! let secret = ClientSecret::from_file("credentials.json")?;
//! let receiver = LoopbackReceiver::bind().await?;
//! let client = OAuthClient::from_client_secret(&secret)?
//!     .with_redirect_uri(receiver.redirect_uri());
//! let flow = AuthorizationCodeFlow::new(client).with_pkce();
//!
//! let url = flow.authorization_url(None, Some("state"))?;
//! println!("Visit: {url}");
//!
//! let code = receiver.receive("state").await?;
//! let token = flow.exchange_code(&code, None).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod credentials;
mod error;
pub mod flow;
pub mod provider;
mod secret;
pub mod token;

pub use credentials::CredentialProvider;
pub use error::{Error, Result};
pub use flow::{
    AuthorizationCodeFlow, LoopbackReceiver, OAuthClient, PkceChallenge, RedirectParams,
    parse_redirect_request,
};
pub use provider::{GMAIL_READONLY_SCOPE, Provider};
pub use secret::ClientSecret;
pub use token::{Token, TokenStore};
