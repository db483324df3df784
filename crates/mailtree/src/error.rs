//! Error types for sending mail.

use crate::transport::BoxError;

/// Result type alias for mailer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by [`Mailer`](crate::Mailer).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Neither text, HTML nor an attachment was supplied.
    #[error("Email content is empty")]
    EmptyContent,

    /// No destination address was given.
    #[error("No recipients specified")]
    MissingRecipient,

    /// The content tree could not be assembled.
    #[error("Failed to compose message: {0}")]
    Compose(#[source] mailtree_mime::Error),

    /// The transport failed; its error is passed through untouched.
    #[error("Transport failed: {0}")]
    Transport(#[source] BoxError),
}

impl From<mailtree_mime::Error> for Error {
    fn from(err: mailtree_mime::Error) -> Self {
        match err {
            mailtree_mime::Error::EmptyContent => Self::EmptyContent,
            other => Self::Compose(other),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_content_keeps_its_kind() {
        let err = Error::from(mailtree_mime::Error::EmptyContent);
        assert!(matches!(err, Error::EmptyContent));
    }

    #[test]
    fn test_transport_error_is_source() {
        let inner: BoxError = "connection refused".into();
        let err = Error::Transport(inner);
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection refused");
    }
}
