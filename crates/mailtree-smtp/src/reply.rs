//! SMTP replies.
//!
//! Replies can be single-line or multi-line:
//! - Single: `250 OK\r\n`
//! - Multi: `250-First line\r\n250-Second line\r\n250 Last line\r\n`

use crate::error::{Error, Result};
use std::fmt;

/// SMTP reply code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ReplyCode(u16);

impl ReplyCode {
    /// 220 Service ready
    pub const SERVICE_READY: Self = Self(220);
    /// 221 Service closing transmission channel
    pub const CLOSING: Self = Self(221);
    /// 250 Requested mail action okay, completed
    pub const OK: Self = Self(250);
    /// 354 Start mail input
    pub const START_DATA: Self = Self(354);

    /// Creates a new reply code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true if this is a success code (2xx).
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }
}

impl fmt::Display for ReplyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SMTP reply from server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Reply code (e.g., 250).
    pub code: ReplyCode,
    /// Reply text, one entry per line.
    pub lines: Vec<String>,
}

impl Reply {
    /// Parses a reply from its raw lines (without line terminators).
    ///
    /// # Errors
    ///
    /// Returns an error if the reply is empty or a line is malformed.
    pub fn parse(raw: &[String]) -> Result<Self> {
        let first = raw
            .first()
            .ok_or_else(|| Error::Protocol("Empty reply".into()))?;

        let code = first
            .get(..3)
            .and_then(|c| c.parse::<u16>().ok())
            .ok_or_else(|| Error::Protocol(format!("Invalid reply code in {first:?}")))?;

        let mut lines = Vec::with_capacity(raw.len());
        for line in raw {
            if !line.starts_with(&first[..3]) {
                return Err(Error::Protocol(format!("Mismatched reply line: {line:?}")));
            }
            let text = match line.len() {
                3 => "",
                4.. => line
                    .get(4..)
                    .ok_or_else(|| Error::Protocol(format!("Malformed reply line: {line:?}")))?,
                _ => return Err(Error::Protocol(format!("Malformed reply line: {line:?}"))),
            };
            lines.push(text.to_string());
        }

        Ok(Self {
            code: ReplyCode::new(code),
            lines,
        })
    }

    /// Returns true if this is a success reply (2xx).
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.code.is_success()
    }

    /// Returns the full reply text as a single string.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Returns the reply if its code is `expected` (or any 2xx when
    /// `expected` is `None`), otherwise an [`Error::Smtp`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Smtp`] carrying the server's code and text.
    pub fn check(self, expected: Option<ReplyCode>) -> Result<Self> {
        let accepted = expected.map_or_else(|| self.is_success(), |code| self.code == code);
        if accepted {
            Ok(self)
        } else {
            Err(Error::smtp(self.code.as_u16(), self.text()))
        }
    }

    /// Extension keywords advertised in an EHLO reply, upper-cased. The
    /// first line is the server greeting and is skipped.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        self.lines
            .iter()
            .skip(1)
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.trim().to_ascii_uppercase())
            .collect()
    }
}

/// Checks if a line is the last line of a multi-line reply.
///
/// Multi-line replies use `-` after the code for continuation lines and a
/// space (or nothing) on the last line.
#[must_use]
pub fn is_last_line(line: &str) -> bool {
    line.len() == 3 || (line.len() >= 4 && line.as_bytes()[3] == b' ')
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_single_line_reply() {
        let reply = Reply::parse(&lines(&["250 OK"])).unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, vec!["OK"]);
        assert!(reply.is_success());
    }

    #[test]
    fn test_parse_multi_line_reply() {
        let reply = Reply::parse(&lines(&[
            "250-smtp.example.com",
            "250-STARTTLS",
            "250 auth plain login",
        ]))
        .unwrap();
        assert_eq!(reply.code.as_u16(), 250);
        assert_eq!(reply.extensions(), ["STARTTLS", "AUTH PLAIN LOGIN"]);
    }

    #[test]
    fn test_parse_bare_code() {
        let reply = Reply::parse(&lines(&["250"])).unwrap();
        assert_eq!(reply.lines, vec![""]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Reply::parse(&[]).is_err());
        assert!(Reply::parse(&lines(&["25"])).is_err());
        assert!(Reply::parse(&lines(&["ABC OK"])).is_err());
        assert!(Reply::parse(&lines(&["250-a", "251 b"])).is_err());
    }

    #[test]
    fn test_parse_non_ascii_separator_is_error() {
        let err = Reply::parse(&lines(&["250é extension", "250 OK"])).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));

        let reply = Reply::parse(&lines(&["250-héllo", "250 OK"])).unwrap();
        assert_eq!(reply.lines, vec!["héllo", "OK"]);
    }

    #[test]
    fn test_check() {
        let ok = Reply::parse(&lines(&["250 OK"])).unwrap();
        assert!(ok.clone().check(None).is_ok());
        assert!(ok.check(Some(ReplyCode::START_DATA)).is_err());

        let err = Reply::parse(&lines(&["550 No such user"]))
            .unwrap()
            .check(None)
            .unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(err.to_string(), "SMTP error 550: No such user");
    }

    #[test]
    fn test_is_last_line() {
        assert!(is_last_line("250 OK"));
        assert!(is_last_line("250"));
        assert!(!is_last_line("250-Continuing"));
        assert!(!is_last_line("25"));
    }
}
