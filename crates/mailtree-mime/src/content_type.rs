//! MIME content type handling.

use crate::boundary::BOUNDARY_PREFIX;
use crate::error::{Error, Result};
use crate::header::{HeaderField, names};
use std::fmt;

/// MIME content type with parameters kept in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "jpeg").
    pub sub_type: String,
    /// Parameters (e.g., charset=utf-8, boundary=xxx).
    pub parameters: Vec<(String, String)>,
}

impl ContentType {
    /// Creates a new content type.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: Vec::new(),
        }
    }

    /// Creates a text/plain content type.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain").with_parameter("charset", "utf-8")
    }

    /// Creates a text/html content type.
    #[must_use]
    pub fn text_html() -> Self {
        Self::new("text", "html").with_parameter("charset", "utf-8")
    }

    /// Creates an application/octet-stream content type.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::new("application", "octet-stream")
    }

    /// Creates a multipart/mixed content type with boundary.
    #[must_use]
    pub fn multipart_mixed(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "mixed").with_parameter("boundary", boundary)
    }

    /// Creates a multipart/alternative content type with boundary.
    #[must_use]
    pub fn multipart_alternative(boundary: impl Into<String>) -> Self {
        Self::new("multipart", "alternative").with_parameter("boundary", boundary)
    }

    /// Sets a parameter, replacing an existing one with the same key.
    #[must_use]
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.parameters.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&key)) {
            Some(slot) => slot.1 = value,
            None => self.parameters.push((key, value)),
        }
        self
    }

    /// Returns a parameter value by key, ignoring ASCII case.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset")
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameter("boundary")
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type.eq_ignore_ascii_case("multipart")
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2=value2`
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing.
    pub fn parse(s: &str) -> Result<Self> {
        let mut parts = s.split(';');

        let type_str = parts.next().unwrap_or_default().trim();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("Missing subtype in {s:?}")))?;

        let main_type = main_type.trim().to_lowercase();
        let sub_type = sub_type.trim().to_lowercase();
        if main_type.is_empty() || sub_type.is_empty() {
            return Err(Error::InvalidContentType(format!("Empty type in {s:?}")));
        }

        let mut content_type = Self::new(main_type, sub_type);
        for param in parts {
            if let Some((key, value)) = param.trim().split_once('=') {
                let key = key.trim().to_lowercase();
                let value = value.trim().trim_matches('"');
                content_type = content_type.with_parameter(key, value);
            }
        }

        Ok(content_type)
    }

    /// Converts into a `Content-Type` header whose attributes are
    /// `type/subtype` followed by one `key=value` per parameter.
    #[must_use]
    pub fn to_header(&self) -> HeaderField {
        let mut attrs = vec![format!("{}/{}", self.main_type, self.sub_type)];
        attrs.extend(self.parameters.iter().map(|(k, v)| {
            if k.eq_ignore_ascii_case("boundary") {
                format!("{BOUNDARY_PREFIX}{v}")
            } else {
                format!("{k}={v}")
            }
        }));
        HeaderField::new(names::CONTENT_TYPE, attrs)
    }
}

impl From<ContentType> for HeaderField {
    fn from(ct: ContentType) -> Self {
        ct.to_header()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let main = &self.main_type;
        let sub = &self.sub_type;
        write!(f, "{main}/{sub}")?;

        for (key, value) in &self.parameters {
            // Quote value if it contains special characters
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_text_plain() {
        let ct = ContentType::text_plain();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.charset(), Some("utf-8"));
    }

    #[test]
    fn test_multipart_mixed() {
        let ct = ContentType::multipart_mixed("boundary123");
        assert_eq!(ct.boundary(), Some("boundary123"));
        assert!(ct.is_multipart());
    }

    #[test]
    fn test_content_type_parse() {
        let ct = ContentType::parse("Application/PDF; name=\"report.pdf\"").unwrap();
        assert_eq!(ct.main_type, "application");
        assert_eq!(ct.sub_type, "pdf");
        assert_eq!(ct.parameter("name"), Some("report.pdf"));
    }

    #[test]
    fn test_content_type_parse_errors() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("text/").is_err());
    }

    #[test]
    fn test_with_parameter_replaces() {
        let ct = ContentType::text_plain().with_parameter("Charset", "iso-8859-1");
        assert_eq!(ct.parameters.len(), 1);
        assert_eq!(ct.charset(), Some("iso-8859-1"));
    }

    #[test]
    fn test_to_header_keeps_order() {
        let header = ContentType::multipart_alternative("main body").to_header();
        assert_eq!(
            header.encode().unwrap(),
            "Content-Type: multipart/alternative;boundary=main body\r\n"
        );

        let header: HeaderField = ContentType::octet_stream()
            .with_parameter("name", "a.bin")
            .into();
        assert_eq!(header.values(), ["application/octet-stream", "name=a.bin"]);
    }

    #[test]
    fn test_content_type_display() {
        let ct = ContentType::multipart_mixed("a b");
        assert_eq!(ct.to_string(), "multipart/mixed; boundary=\"a b\"");
    }
}
