//! SMTP command builder.

use crate::error::{Error, Result};
use std::fmt;

/// SMTP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// EHLO - Extended greeting
    Ehlo {
        /// Client hostname
        hostname: String,
    },
    /// STARTTLS - Upgrade to TLS
    StartTls,
    /// AUTH PLAIN with an initial response (RFC 4954)
    AuthPlain {
        /// Base64 of `\0username\0password`
        initial_response: String,
    },
    /// MAIL FROM - Start mail transaction
    MailFrom {
        /// Sender address
        from: String,
        /// SIZE parameter
        size: Option<usize>,
    },
    /// RCPT TO - Add recipient
    RcptTo {
        /// Recipient address
        to: String,
    },
    /// DATA - Begin message data
    Data,
    /// QUIT - Close connection
    Quit,
}

impl Command {
    /// Serializes the command to bytes, CRLF included.
    #[must_use]
    pub fn serialize(&self) -> Vec<u8> {
        let mut line = match self {
            Self::Ehlo { hostname } => format!("EHLO {hostname}"),
            Self::StartTls => "STARTTLS".to_string(),
            Self::AuthPlain { initial_response } => format!("AUTH PLAIN {initial_response}"),
            Self::MailFrom { from, size: None } => format!("MAIL FROM:<{from}>"),
            Self::MailFrom {
                from,
                size: Some(size),
            } => format!("MAIL FROM:<{from}> SIZE={size}"),
            Self::RcptTo { to } => format!("RCPT TO:<{to}>"),
            Self::Data => "DATA".to_string(),
            Self::Quit => "QUIT".to_string(),
        }
        .into_bytes();
        line.extend_from_slice(b"\r\n");
        line
    }
}

/// Renders the command for logs, with credentials masked.
impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AuthPlain { .. } => f.write_str("AUTH PLAIN <redacted>"),
            other => {
                let bytes = other.serialize();
                f.write_str(String::from_utf8_lossy(&bytes).trim_end())
            }
        }
    }
}

/// Checks that an envelope address can be placed between `<` and `>`
/// without breaking the command line.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] for an empty address or one containing
/// CR, LF, `<` or `>`.
pub fn envelope_address(addr: &str) -> Result<String> {
    let addr = addr.trim();
    if addr.is_empty() || addr.contains(['\r', '\n', '<', '>']) {
        return Err(Error::InvalidAddress(addr.to_string()));
    }
    Ok(addr.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ehlo_command() {
        let cmd = Command::Ehlo {
            hostname: "client.example.com".to_string(),
        };
        assert_eq!(cmd.serialize(), b"EHLO client.example.com\r\n");
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(Command::StartTls.serialize(), b"STARTTLS\r\n");
        assert_eq!(Command::Data.serialize(), b"DATA\r\n");
        assert_eq!(Command::Quit.serialize(), b"QUIT\r\n");
    }

    #[test]
    fn test_auth_plain() {
        let cmd = Command::AuthPlain {
            initial_response: "AHVzZXIAcGFzcw==".to_string(),
        };
        assert_eq!(cmd.serialize(), b"AUTH PLAIN AHVzZXIAcGFzcw==\r\n");
        assert_eq!(format!("{cmd:?}"), "AUTH PLAIN <redacted>");
    }

    #[test]
    fn test_mail_from() {
        let cmd = Command::MailFrom {
            from: "sender@example.com".to_string(),
            size: None,
        };
        assert_eq!(cmd.serialize(), b"MAIL FROM:<sender@example.com>\r\n");
        assert_eq!(format!("{cmd:?}"), "MAIL FROM:<sender@example.com>");

        let cmd = Command::MailFrom {
            from: "sender@example.com".to_string(),
            size: Some(12345),
        };
        assert_eq!(
            cmd.serialize(),
            b"MAIL FROM:<sender@example.com> SIZE=12345\r\n"
        );
    }

    #[test]
    fn test_rcpt_to_command() {
        let cmd = Command::RcptTo {
            to: "recipient@example.com".to_string(),
        };
        assert_eq!(cmd.serialize(), b"RCPT TO:<recipient@example.com>\r\n");
    }

    #[test]
    fn test_envelope_address() {
        assert_eq!(envelope_address(" a@example.com ").unwrap(), "a@example.com");
        assert!(envelope_address("").is_err());
        assert!(envelope_address("a@example.com>\r\nRCPT TO:<b@example.com").is_err());
    }
}
