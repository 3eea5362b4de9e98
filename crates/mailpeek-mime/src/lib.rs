//! # mailpeek-mime
//!
//! Message model and plaintext extraction for Gmail API payloads.
//!
//! ## Features
//!
//! - **Payload tree**: MIME parts as a tagged enum (leaf, container, empty)
//! - **Text extraction**: Recursive walk that collects every `text/plain` leaf
//! - **Decoding**: Lossy base64url decoding that never fails the extraction
//! - **Wire format**: Optional `serde` support for the Gmail `messages.get` JSON
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailpeek_mime::{MessagePart, extract};
//!
//! let payload = MessagePart::container(
//!     "multipart/alternative",
//!     vec![
//!         MessagePart::leaf("text/plain", "aGVsbG8="),
//!         MessagePart::leaf("text/html", "PGI-aGVsbG88L2I-"),
//!     ],
//! );
//!
//! assert_eq!(extract(&payload), "hello");
//! ```
//!
//! ### Header Lookup
//!
//! ```ignore
//! let subject = message.header("Subject"); // "" when absent
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod error;
mod extract;
mod header;
mod message;
mod part;

pub mod encoding;

pub use error::{ExtractionError, Result};
pub use extract::{NO_READABLE_CONTENT, TEXT_PLAIN, extract, extract_from_parts};
pub use header::{Header, Headers};
pub use message::Message;
pub use part::MessagePart;
