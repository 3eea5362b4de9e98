//! Error types for the Gmail client.

/// Result type alias for Gmail operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a listing.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport or body decoding error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API answered with a non-success status.
    #[error("Gmail API error {status}: {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Message from the error body, or the raw body.
        message: String,
    },

    /// The batch response envelope could not be parsed.
    #[error("Invalid batch response: {0}")]
    InvalidBatch(String),
}

/// Failure of a single sub-request inside a batch.
///
/// These are logged and skipped; they never abort the listing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ItemError {
    /// The sub-request returned an error status.
    #[error("API error {code}: {message}")]
    Api {
        /// HTTP status code of the sub-response.
        code: u16,
        /// Error message.
        message: String,
    },

    /// The sub-response body was not a message.
    #[error("Undecodable message: {0}")]
    Decode(String),

    /// The batch response had no part for this request.
    #[error("No response for this request")]
    Missing,
}

impl ItemError {
    /// Short machine-readable kind, used in log fields.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Api { .. } => "api",
            Self::Decode(_) => "decode",
            Self::Missing => "missing",
        }
    }
}
