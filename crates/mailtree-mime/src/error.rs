//! Error types for MIME operations.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Invalid MIME header.
    #[error("Invalid MIME header: {0}")]
    InvalidHeader(String),

    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// A `boundary` attribute on a Content-Type header could not be used.
    #[error("Malformed boundary attribute {attribute:?}: {reason}")]
    MalformedBoundary {
        /// The offending attribute text.
        attribute: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// No text, HTML or attachment content was supplied.
    #[error("Email content is empty")]
    EmptyContent,
}
