//! MIME header fields.

use crate::error::{Error, Result};
use std::fmt;

/// Line terminator used throughout the wire format.
pub const CRLF: &str = "\r\n";

/// Well-known header names.
pub mod names {
    /// `From`
    pub const FROM: &str = "From";
    /// `To`
    pub const TO: &str = "To";
    /// `Date`
    pub const DATE: &str = "Date";
    /// `Subject`
    pub const SUBJECT: &str = "Subject";
    /// `MIME-Version`
    pub const MIME_VERSION: &str = "MIME-Version";
    /// `Content-Type`
    pub const CONTENT_TYPE: &str = "Content-Type";
    /// `Content-Transfer-Encoding`
    pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
    /// `Content-Disposition`
    pub const CONTENT_DISPOSITION: &str = "Content-Disposition";
}

/// A single header: a name and an ordered list of attributes.
///
/// Attributes are written joined by `;` with no escaping, so
/// `HeaderField::new("Content-Type", ["text/plain", "charset=utf-8"])`
/// encodes as `Content-Type: text/plain;charset=utf-8\r\n`. Callers are
/// responsible for supplying wire-safe attribute text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderField {
    name: String,
    values: Vec<String>,
}

impl HeaderField {
    /// Creates a header from a name and attributes, kept in the given order.
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Like [`HeaderField::new`], but rejects names that cannot appear on
    /// the wire (empty, or containing `:`, whitespace or control bytes).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHeader`] if the name is unusable.
    pub fn try_new<I, S>(name: impl Into<String>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let field = Self::new(name, values);
        if field.name.is_empty() {
            return Err(Error::InvalidHeader("header name is empty".to_string()));
        }
        if field
            .name
            .bytes()
            .any(|b| b == b':' || b.is_ascii_whitespace() || b.is_ascii_control())
        {
            return Err(Error::InvalidHeader(format!(
                "header name {:?} contains a forbidden character",
                field.name
            )));
        }
        Ok(field)
    }

    /// Returns the header name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the attributes in declared order.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns true if this header's name matches `name` ignoring ASCII case.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Appends attributes after the existing ones. Duplicates are kept.
    pub fn add_attrs<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values.extend(values.into_iter().map(Into::into));
    }

    /// Encodes the header as one wire line, or `None` when it has no
    /// attributes.
    #[must_use]
    pub fn encode(&self) -> Option<String> {
        if self.values.is_empty() {
            return None;
        }
        Some(format!("{}: {}{CRLF}", self.name, self.values.join(";")))
    }

    /// Appends the encoded line to `buf`. Writes nothing for a header with
    /// no attributes.
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        if self.values.is_empty() {
            return;
        }
        buf.extend_from_slice(self.name.as_bytes());
        buf.extend_from_slice(b": ");
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                buf.push(b';');
            }
            buf.extend_from_slice(value.as_bytes());
        }
        buf.extend_from_slice(CRLF.as_bytes());
    }
}

impl fmt::Display for HeaderField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.encode() {
            Some(line) => f.write_str(&line),
            None => Ok(()),
        }
    }
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

    #[test]
    fn test_encode_single_value() {
        let header = HeaderField::new("Subject", ["Hello"]);
        assert_eq!(header.encode().unwrap(), "Subject: Hello\r\n");
    }

    #[test]
    fn test_encode_joins_with_semicolon() {
        let header = HeaderField::new("Content-Type", ["text/plain", "charset=utf-8"]);
        assert_eq!(
            header.encode().unwrap(),
            "Content-Type: text/plain;charset=utf-8\r\n"
        );
    }

    #[test]
    fn test_encode_empty_values() {
        let header = HeaderField::new("X-Empty", Vec::<String>::new());
        assert!(header.encode().is_none());
        assert_eq!(header.to_string(), "");

        let mut buf = Vec::new();
        header.write_to(&mut buf);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_write_to_matches_encode() {
        let header = HeaderField::new("Content-Disposition", ["attachment", "filename=a.pdf"]);
        let mut buf = Vec::new();
        header.write_to(&mut buf);
        assert_eq!(buf, header.encode().unwrap().into_bytes());
    }

    #[test]
    fn test_add_attrs_keeps_order_and_duplicates() {
        let mut header = HeaderField::new("X-Tag", ["a"]);
        header.add_attrs(["b", "a"]);
        assert_eq!(header.values(), ["a", "b", "a"]);
        assert_eq!(header.encode().unwrap(), "X-Tag: a;b;a\r\n");
    }

    #[test]
    fn test_add_attrs_on_empty_header() {
        let mut header = HeaderField::new("X-Tag", Vec::<String>::new());
        header.add_attrs(["late"]);
        assert_eq!(header.encode().unwrap(), "X-Tag: late\r\n");
    }

    #[test]
    fn test_no_escaping() {
        let header = HeaderField::new("X-Raw", ["a;b", "c\"d"]);
        assert_eq!(header.encode().unwrap(), "X-Raw: a;b;c\"d\r\n");
    }

    #[test]
    fn test_try_new_rejects_bad_names() {
        assert!(HeaderField::try_new("", ["x"]).is_err());
        assert!(HeaderField::try_new("Bad Name", ["x"]).is_err());
        assert!(HeaderField::try_new("Bad:Name", ["x"]).is_err());
        assert!(HeaderField::try_new("X-Good", ["x"]).is_ok());
    }

    #[test]
    fn test_is_ignores_case() {
        let header = HeaderField::new("content-type", ["text/plain"]);
        assert!(header.is(names::CONTENT_TYPE));
        assert!(!header.is(names::SUBJECT));
    }
}
