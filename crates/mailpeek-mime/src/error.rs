//! Error types for per-message processing.

/// Result type alias for message processing.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Reasons a fetched message cannot be turned into a report entry.
///
/// Decoding problems are not represented here: body data that fails to
/// decode is replaced rather than reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    /// The message carries no identifier.
    #[error("Message has no id")]
    MissingId,

    /// The message has no payload tree.
    #[error("Message {id} has no payload")]
    MissingPayload {
        /// Identifier of the offending message.
        id: String,
    },
}

impl ExtractionError {
    /// Short, stable name of the failure class, used in log lines.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingId => "missing_id",
            Self::MissingPayload { .. } => "missing_payload",
        }
    }
}
