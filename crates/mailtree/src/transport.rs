//! Delivery of encoded messages.

use std::future::Future;

use mailtree_smtp::Config;

/// Opaque error returned by a [`Transport`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Envelope sender and recipients, kept apart from the message headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    from: String,
    to: Vec<String>,
}

impl Envelope {
    /// Creates an envelope. Blank recipients are dropped.
    ///
    /// Returns `None` if no recipient remains.
    #[must_use]
    pub fn new<I, S>(from: impl Into<String>, to: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let to: Vec<String> = to
            .into_iter()
            .map(|addr| addr.as_ref().trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect();
        if to.is_empty() {
            return None;
        }
        Some(Self {
            from: from.into(),
            to,
        })
    }

    /// Sender address.
    #[must_use]
    pub fn from(&self) -> &str {
        &self.from
    }

    /// Recipient addresses.
    #[must_use]
    pub fn to(&self) -> &[String] {
        &self.to
    }
}

/// Delivers a fully encoded message.
pub trait Transport {
    /// Sends `message` to every recipient of `envelope`.
    fn send_raw(
        &self,
        envelope: &Envelope,
        message: &[u8],
    ) -> impl Future<Output = Result<(), BoxError>> + Send;
}

/// [`Transport`] backed by a fresh SMTP session per message.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    config: Config,
}

impl SmtpTransport {
    /// Creates a transport for the server described by `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Server configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }
}

impl Transport for SmtpTransport {
    async fn send_raw(&self, envelope: &Envelope, message: &[u8]) -> Result<(), BoxError> {
        mailtree_smtp::send_mail(&self.config, envelope.from(), envelope.to(), message).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_drops_blank_recipients() {
        let envelope = Envelope::new("me@example.com", ["a@example.com", " ", ""]).unwrap();
        assert_eq!(envelope.from(), "me@example.com");
        assert_eq!(envelope.to(), ["a@example.com"]);
    }

    #[test]
    fn test_envelope_requires_recipient() {
        assert!(Envelope::new("me@example.com", Vec::<String>::new()).is_none());
        assert!(Envelope::new("me@example.com", [" "]).is_none());
    }
}
