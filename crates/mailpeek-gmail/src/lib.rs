//! # mailpeek-gmail
//!
//! Gmail REST API client that lists messages matching a search query.
//!
//! ## Features
//!
//! - **Search**: `users.messages.list` with page-token pagination
//! - **Batch fetch**: full messages through the batch endpoint, 100 per request
//! - **Partial results**: per-message failures are reported, not fatal
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpeek_gmail::GmailClient;
//!
//! let client = GmailClient::new(reqwest::Client::new(), token.access_token);
//! for message in client.list_messages("is:unread").await? {
//!     println!("{}: {}", message.id, message.subject());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod batch;
mod client;
mod error;
pub mod model;

pub use batch::{BatchItem, MAX_BATCH_SIZE};
pub use client::{DEFAULT_API_BASE, DEFAULT_BATCH_URL, DEFAULT_MAX_MESSAGES, GmailClient};
pub use error::{Error, ItemError, Result};
pub use mailpeek_mime::Message;
