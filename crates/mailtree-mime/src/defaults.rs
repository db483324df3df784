//! Default header table used when composing messages.

use crate::content_type::ContentType;
use crate::encoding::TransferEncoding;
use crate::header::{HeaderField, names};

/// Immutable table of the headers and boundary tokens the composer puts on
/// the parts it creates.
///
/// The table is plain data: build one, share it by reference across any
/// number of concurrent compositions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DefaultHeaders {
    /// Value of the `MIME-Version` header.
    pub mime_version: String,
    /// Content type of the plain-text part.
    pub text_type: ContentType,
    /// Content type of the HTML part.
    pub html_type: ContentType,
    /// Transfer encoding applied to the plain-text body.
    pub text_encoding: TransferEncoding,
    /// Transfer encoding applied to the HTML body.
    pub html_encoding: TransferEncoding,
    /// Boundary of the `multipart/alternative` text/HTML container.
    pub alternative_boundary: String,
    /// Boundary of the `multipart/mixed` container holding attachments.
    pub mixed_boundary: String,
}

impl Default for DefaultHeaders {
    fn default() -> Self {
        Self {
            mime_version: "1.0".to_string(),
            text_type: ContentType::text_plain(),
            html_type: ContentType::text_html(),
            text_encoding: TransferEncoding::QuotedPrintable,
            html_encoding: TransferEncoding::QuotedPrintable,
            alternative_boundary: "main body".to_string(),
            mixed_boundary: "mixed body".to_string(),
        }
    }
}

impl DefaultHeaders {
    /// `MIME-Version` header.
    #[must_use]
    pub fn mime_version_header(&self) -> HeaderField {
        HeaderField::new(names::MIME_VERSION, [self.mime_version.as_str()])
    }

    /// `Content-Type` and `Content-Transfer-Encoding` headers of the text part.
    #[must_use]
    pub fn text_headers(&self) -> Vec<HeaderField> {
        vec![
            self.text_type.to_header(),
            transfer_encoding_header(self.text_encoding),
        ]
    }

    /// `Content-Type` and `Content-Transfer-Encoding` headers of the HTML part.
    #[must_use]
    pub fn html_headers(&self) -> Vec<HeaderField> {
        vec![
            self.html_type.to_header(),
            transfer_encoding_header(self.html_encoding),
        ]
    }
}

/// `Content-Transfer-Encoding` header for `encoding`.
#[must_use]
pub fn transfer_encoding_header(encoding: TransferEncoding) -> HeaderField {
    HeaderField::new(names::CONTENT_TRANSFER_ENCODING, [encoding.to_string()])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = DefaultHeaders::default();
        assert_eq!(
            defaults.mime_version_header().encode().unwrap(),
            "MIME-Version: 1.0\r\n"
        );

        let lines: Vec<String> = defaults
            .text_headers()
            .iter()
            .filter_map(HeaderField::encode)
            .collect();
        assert_eq!(
            lines,
            [
                "Content-Type: text/plain;charset=utf-8\r\n",
                "Content-Transfer-Encoding: quoted-printable\r\n",
            ]
        );
    }

    #[test]
    fn test_table_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DefaultHeaders>();
    }
}
