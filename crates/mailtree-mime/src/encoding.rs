//! Transfer encodings for part bodies and header values.
//!
//! Supports Base64, Quoted-Printable, and RFC 2047 header encoding.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::fmt::Write as _;

/// Maximum encoded line length (RFC 2045).
pub const MAX_LINE_LENGTH: usize = 76;

/// Transfer encoding types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TransferEncoding {
    /// 7-bit ASCII.
    SevenBit,
    /// 8-bit text.
    EightBit,
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    #[default]
    QuotedPrintable,
    /// Binary (no encoding).
    Binary,
}

impl TransferEncoding {
    /// Encodes `text` for transport with this encoding. 7bit, 8bit and
    /// binary leave the text untouched.
    #[must_use]
    pub fn apply(self, text: &str) -> String {
        match self {
            Self::Base64 => encode_base64_wrapped(text.as_bytes()),
            Self::QuotedPrintable => encode_quoted_printable(text),
            Self::SevenBit | Self::EightBit | Self::Binary => text.to_string(),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SevenBit => write!(f, "7bit"),
            Self::EightBit => write!(f, "8bit"),
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// Encodes data as Base64 on a single line.
#[must_use]
pub fn encode_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Encodes data as Base64 split into CRLF-separated lines of at most
/// 76 characters. No trailing line break is added.
#[must_use]
pub fn encode_base64_wrapped(data: &[u8]) -> String {
    let encoded = STANDARD.encode(data);
    let mut result = String::with_capacity(encoded.len() + encoded.len() / MAX_LINE_LENGTH * 2);

    // Base64 output is ASCII, so byte chunks are char boundaries.
    for (i, line) in encoded.as_bytes().chunks(MAX_LINE_LENGTH).enumerate() {
        if i > 0 {
            result.push_str("\r\n");
        }
        result.extend(line.iter().map(|&b| char::from(b)));
    }

    result
}

/// Encodes text using Quoted-Printable encoding (RFC 2045).
///
/// Line breaks (`\n` or `\r\n`) are kept as hard CRLF breaks; long lines
/// get `=` soft breaks. Whitespace before a line break is encoded.
#[must_use]
pub fn encode_quoted_printable(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut line_length = 0;
    let bytes = text.as_bytes();

    for (i, &byte) in bytes.iter().enumerate() {
        if byte == b'\r' && bytes.get(i + 1) == Some(&b'\n') {
            continue;
        }
        if byte == b'\n' {
            result.push_str("\r\n");
            line_length = 0;
            continue;
        }

        let at_line_end = matches!(bytes.get(i + 1), None | Some(b'\n'))
            || (bytes.get(i + 1) == Some(&b'\r') && bytes.get(i + 2) == Some(&b'\n'));

        let literal = match byte {
            b'!'..=b'<' | b'>'..=b'~' => true,
            b' ' | b'\t' => !at_line_end,
            _ => false,
        };
        let width = if literal { 1 } else { 3 };

        // Leave room for the trailing '=' of a soft break
        if line_length + width > MAX_LINE_LENGTH - 1 {
            result.push_str("=\r\n");
            line_length = 0;
        }

        if literal {
            result.push(char::from(byte));
        } else {
            let _ = write!(result, "={byte:02X}");
        }
        line_length += width;
    }

    result
}

/// Maximum length of one RFC 2047 encoded-word.
pub const MAX_ENCODED_WORD_LENGTH: usize = 75;

/// Encodes a header value using RFC 2047 encoding.
///
/// Format: `=?charset?B?encoded-text?=`. Values that are printable ASCII and
/// contain neither `=` nor `?` are returned unchanged. Anything else,
/// including values carrying CR or LF, is encoded. Long values are split on
/// character boundaries into several encoded-words of at most
/// [`MAX_ENCODED_WORD_LENGTH`] characters, separated by folding whitespace.
#[must_use]
pub fn encode_rfc2047(text: &str, charset: &str) -> String {
    let plain = text
        .chars()
        .all(|c| (c.is_ascii_graphic() || c == ' ') && c != '=' && c != '?');
    if plain {
        return text.to_string();
    }

    // "=?" charset "?B?" ... "?="
    let overhead = charset.len() + 7;
    let max_bytes = (MAX_ENCODED_WORD_LENGTH.saturating_sub(overhead) / 4 * 3).max(4);

    let mut words = Vec::new();
    let mut start = 0;
    let mut end = 0;
    for (i, c) in text.char_indices() {
        if i + c.len_utf8() - start > max_bytes && end > start {
            words.push(&text[start..end]);
            start = end;
        }
        end = i + c.len_utf8();
    }
    words.push(&text[start..end]);

    words
        .iter()
        .map(|chunk| format!("=?{charset}?B?{}?=", encode_base64(chunk.as_bytes())))
        .collect::<Vec<_>>()
        .join("\r\n ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    #[test]
    fn test_base64_encode() {
        assert_eq!(encode_base64(b"Hello, World!"), "SGVsbG8sIFdvcmxkIQ==");
    }

    #[test]
    fn test_base64_wrapped() {
        let data = vec![0u8; 120];
        let encoded = encode_base64_wrapped(&data);
        let lines: Vec<&str> = encoded.split("\r\n").collect();

        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.len() <= MAX_LINE_LENGTH));
        assert_eq!(lines.concat(), encode_base64(&data));
        assert!(!encoded.ends_with("\r\n"));
    }

    #[test]
    fn test_base64_wrapped_short() {
        assert_eq!(encode_base64_wrapped(b"hi"), "aGk=");
        assert_eq!(encode_base64_wrapped(b""), "");
    }

    #[test]
    fn test_quoted_printable_encode() {
        assert_eq!(encode_quoted_printable("Hello, World!"), "Hello, World!");
        assert_eq!(encode_quoted_printable("<p>hi</p>"), "<p>hi</p>");
        assert_eq!(encode_quoted_printable("a=b"), "a=3Db");

        let encoded = encode_quoted_printable("Héllo, Wørld!");
        assert_eq!(encoded, "H=C3=A9llo, W=C3=B8rld!");
    }

    #[test]
    fn test_quoted_printable_line_breaks() {
        assert_eq!(encode_quoted_printable("a\nb"), "a\r\nb");
        assert_eq!(encode_quoted_printable("a\r\nb\r\n"), "a\r\nb\r\n");
        assert_eq!(encode_quoted_printable("trailing \r\nx"), "trailing=20\r\nx");
        assert_eq!(encode_quoted_printable("end\t"), "end=09");
    }

    #[test]
    fn test_quoted_printable_soft_breaks() {
        let text = "x".repeat(200);
        let encoded = encode_quoted_printable(&text);
        for line in encoded.split("\r\n") {
            assert!(line.len() <= MAX_LINE_LENGTH);
        }
        assert_eq!(encoded.replace("=\r\n", ""), text);
    }

    #[test]
    fn test_transfer_encoding_apply() {
        assert_eq!(TransferEncoding::EightBit.apply("é"), "é");
        assert_eq!(TransferEncoding::QuotedPrintable.apply("é"), "=C3=A9");
        assert_eq!(TransferEncoding::Base64.apply("hi"), "aGk=");
        assert_eq!(TransferEncoding::QuotedPrintable.to_string(), "quoted-printable");
        assert_eq!(TransferEncoding::Base64.to_string(), "base64");
    }

    #[test]
    fn test_rfc2047_encode() {
        assert_eq!(encode_rfc2047("Hello", "utf-8"), "Hello");

        let encoded = encode_rfc2047("Héllo", "utf-8");
        assert_eq!(encoded, "=?utf-8?B?SMOpbGxv?=");
    }

    #[test]
    fn test_rfc2047_encodes_line_breaks() {
        let encoded = encode_rfc2047("hi\r\nBcc: evil@example.com", "utf-8");
        assert!(encoded.starts_with("=?utf-8?B?"));
        assert!(!encoded.contains("Bcc:"));
        assert!(!encoded.contains('\n'));

        assert_ne!(encode_rfc2047("tab\there", "utf-8"), "tab\there");
        assert_ne!(encode_rfc2047("bell\u{7}", "utf-8"), "bell\u{7}");
    }

    #[test]
    fn test_rfc2047_splits_long_values() {
        let text = "é".repeat(100);
        let encoded = encode_rfc2047(&text, "utf-8");
        let words: Vec<&str> = encoded.split("\r\n ").collect();

        assert!(words.len() > 1);
        assert!(words.iter().all(|w| w.len() <= MAX_ENCODED_WORD_LENGTH));
        assert!(words.iter().all(|w| w.starts_with("=?utf-8?B?") && w.ends_with("?=")));

        let decoded: Vec<u8> = words
            .iter()
            .flat_map(|w| {
                let inner = &w["=?utf-8?B?".len()..w.len() - 2];
                STANDARD.decode(inner).unwrap()
            })
            .collect();
        assert_eq!(String::from_utf8(decoded).unwrap(), text);
    }
}
