//! Type-state SMTP client.
//!
//! Each state only exposes the commands valid in it, so a message cannot be
//! sent before a recipient has been accepted:
//!
//! ```text
//! Connected --auth_plain--> Authenticated
//!     |                          |
//!     +------- mail_from --------+--> MailTransaction --rcpt_to--> RecipientAdded
//!                                                                      |
//!                              Connected <--send_message-- Data <--data+
//! ```

use crate::command::{Command, envelope_address};
use crate::error::{Error, Result};
use crate::reply::{Reply, ReplyCode, is_last_line};
use crate::stream::{SmtpStream, with_timeout};
use base64::Engine;
use std::marker::PhantomData;
use std::time::Duration;

/// Type-state marker for connected state.
#[derive(Debug)]
pub struct Connected;

/// Type-state marker for authenticated state.
#[derive(Debug)]
pub struct Authenticated;

/// Type-state marker for mail transaction started.
#[derive(Debug)]
pub struct MailTransaction;

/// Type-state marker for recipient added.
#[derive(Debug)]
pub struct RecipientAdded;

/// Type-state marker for data mode.
#[derive(Debug)]
pub struct Data;

/// SMTP client with type-state pattern.
#[derive(Debug)]
pub struct Client<State> {
    stream: SmtpStream,
    extensions: Vec<String>,
    io_timeout: Duration,
    _state: PhantomData<State>,
}

impl<S> Client<S> {
    /// Extension lines advertised by the last EHLO, upper-cased.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns true if the server advertised `keyword` (e.g. `STARTTLS`).
    #[must_use]
    pub fn supports(&self, keyword: &str) -> bool {
        self.extensions
            .iter()
            .any(|ext| ext.split_whitespace().next() == Some(keyword))
    }

    /// Returns true if the server offers AUTH with `mechanism`.
    #[must_use]
    pub fn supports_auth(&self, mechanism: &str) -> bool {
        self.extensions.iter().any(|ext| {
            let mut words = ext.split_whitespace();
            words.next() == Some("AUTH") && words.any(|m| m == mechanism)
        })
    }

    /// Sends QUIT and closes the connection (available in any state).
    ///
    /// # Errors
    ///
    /// Returns an error if the QUIT command fails.
    pub async fn quit(mut self) -> Result<()> {
        let reply = self.send_command(Command::Quit).await?;
        if !reply.is_success() && reply.code != ReplyCode::CLOSING {
            return Err(Error::smtp(reply.code.as_u16(), reply.text()));
        }
        Ok(())
    }

    fn into_state<T>(self) -> Client<T> {
        Client {
            stream: self.stream,
            extensions: self.extensions,
            io_timeout: self.io_timeout,
            _state: PhantomData,
        }
    }

    async fn send_command(&mut self, cmd: Command) -> Result<Reply> {
        tracing::trace!(command = ?cmd, "C:");
        self.stream.write_all(&cmd.serialize()).await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        let stream = &mut self.stream;
        let reply = with_timeout(self.io_timeout, "waiting for a reply", async {
            let mut lines = Vec::new();
            loop {
                let line = stream.read_line().await?;
                if line.is_empty() {
                    continue;
                }
                let is_last = is_last_line(&line);
                lines.push(line);
                if is_last {
                    break;
                }
            }
            Reply::parse(&lines)
        })
        .await?;
        tracing::trace!(code = %reply.code, text = %reply.text(), "S:");
        Ok(reply)
    }

    async fn begin_transaction(
        mut self,
        from: &str,
        size: Option<usize>,
    ) -> Result<Client<MailTransaction>> {
        let size = size.filter(|_| self.supports("SIZE"));
        let cmd = Command::MailFrom {
            from: envelope_address(from)?,
            size,
        };
        self.send_command(cmd).await?.check(None)?;
        Ok(self.into_state())
    }
}

impl Client<Connected> {
    /// Creates a client from a stream and reads the server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the greeting fails or the server refuses
    /// the session.
    pub async fn from_stream(stream: SmtpStream, io_timeout: Duration) -> Result<Self> {
        let mut client = Self {
            stream,
            extensions: Vec::new(),
            io_timeout,
            _state: PhantomData,
        };
        client
            .read_reply()
            .await?
            .check(Some(ReplyCode::SERVICE_READY))?;
        Ok(client)
    }

    /// Sends EHLO and records the advertised extensions.
    ///
    /// # Errors
    ///
    /// Returns an error if the EHLO command fails.
    pub async fn ehlo(mut self, client_hostname: &str) -> Result<Self> {
        let cmd = Command::Ehlo {
            hostname: client_hostname.to_string(),
        };
        let reply = self.send_command(cmd).await?.check(None)?;
        self.extensions = reply.extensions();
        Ok(self)
    }

    /// Upgrades the connection with STARTTLS and repeats EHLO over TLS.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotSupported`] if the server does not advertise
    /// STARTTLS, or an error if the upgrade fails.
    pub async fn starttls(mut self, server_hostname: &str, client_hostname: &str) -> Result<Self> {
        if !self.supports("STARTTLS") {
            return Err(Error::NotSupported("STARTTLS"));
        }
        self.send_command(Command::StartTls).await?.check(None)?;

        self.stream = self.stream.upgrade_to_tls(server_hostname).await?;
        tracing::debug!("Upgraded connection to TLS");

        self.extensions.clear();
        self.ehlo(client_hostname).await
    }

    /// Authenticates using the PLAIN mechanism.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication fails.
    pub async fn auth_plain(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<Authenticated>> {
        if !self.supports_auth("PLAIN") {
            return Err(Error::NotSupported("AUTH PLAIN"));
        }
        let credentials = format!("\0{username}\0{password}");
        let initial_response =
            base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes());

        self.send_command(Command::AuthPlain { initial_response })
            .await?
            .check(None)?;
        Ok(self.into_state())
    }

    /// Starts a mail transaction without authentication (if server allows).
    /// `size` is announced only when the server advertises SIZE.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(self, from: &str, size: Option<usize>) -> Result<Client<MailTransaction>> {
        self.begin_transaction(from, size).await
    }
}

impl Client<Authenticated> {
    /// Starts a mail transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the MAIL FROM command fails.
    pub async fn mail_from(self, from: &str, size: Option<usize>) -> Result<Client<MailTransaction>> {
        self.begin_transaction(from, size).await
    }
}

impl Client<MailTransaction> {
    /// Adds the first recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: &str) -> Result<Client<RecipientAdded>> {
        let cmd = Command::RcptTo {
            to: envelope_address(to)?,
        };
        self.send_command(cmd).await?.check(None)?;
        Ok(self.into_state())
    }
}

impl Client<RecipientAdded> {
    /// Adds another recipient to the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the RCPT TO command fails.
    pub async fn rcpt_to(mut self, to: &str) -> Result<Self> {
        let cmd = Command::RcptTo {
            to: envelope_address(to)?,
        };
        self.send_command(cmd).await?.check(None)?;
        Ok(self)
    }

    /// Begins sending message data.
    ///
    /// # Errors
    ///
    /// Returns an error if the DATA command fails.
    pub async fn data(mut self) -> Result<Client<Data>> {
        self.send_command(Command::Data)
            .await?
            .check(Some(ReplyCode::START_DATA))?;
        Ok(self.into_state())
    }
}

impl Client<Data> {
    /// Sends the message content and completes the transaction.
    ///
    /// Line endings are normalized to CRLF, lines starting with `.` are
    /// dot-stuffed and the terminating `.` line is added.
    ///
    /// # Errors
    ///
    /// Returns an error if sending the message fails or server rejects it.
    pub async fn send_message(mut self, message: &[u8]) -> Result<Client<Connected>> {
        self.stream.write_all(&dot_stuff(message)).await?;
        self.read_reply().await?.check(None)?;
        Ok(self.into_state())
    }
}

/// Prepares message bytes for the DATA phase, terminator included.
///
/// A single trailing line break belongs to the terminator sequence and is
/// not repeated as an empty line.
#[must_use]
pub fn dot_stuff(message: &[u8]) -> Vec<u8> {
    let message = message
        .strip_suffix(b"\r\n")
        .or_else(|| message.strip_suffix(b"\n"))
        .unwrap_or(message);

    let mut out = Vec::with_capacity(message.len() + message.len() / 32 + 5);
    if !message.is_empty() {
        for line in message.split(|&b| b == b'\n') {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            if line.first() == Some(&b'.') {
                out.push(b'.');
            }
            out.extend_from_slice(line);
            out.extend_from_slice(b"\r\n");
        }
    }
    out.extend_from_slice(b".\r\n");
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_stuff_normalizes_line_endings() {
        assert_eq!(dot_stuff(b"a\nb\r\nc"), b"a\r\nb\r\nc\r\n.\r\n");
    }

    #[test]
    fn test_dot_stuff_escapes_leading_dots() {
        assert_eq!(dot_stuff(b".hidden\r\n..\r\n"), b"..hidden\r\n...\r\n.\r\n");
    }

    #[test]
    fn test_dot_stuff_no_blank_line_before_terminator() {
        let out = dot_stuff(b"\r\n--b--\r\n");
        assert_eq!(out, b"\r\n--b--\r\n.\r\n");
    }

    #[test]
    fn test_dot_stuff_empty_message() {
        assert_eq!(dot_stuff(b""), b".\r\n");
    }
}
