//! Message composition.
//!
//! [`MessageComposer`] turns flat inputs (sender, recipients, subject, a
//! text body, an HTML body and attachments) into a [`ContentPart`] tree
//! ready for [`crate::encode`]. The root part carries the message headers
//! followed by the outermost content's own headers, so the tree is at most
//! three levels deep:
//!
//! ```text
//! text only             text + html                text + html + files
//! ---------             -----------                -------------------
//! root (text/plain)     root (multipart/alternative) root (multipart/mixed)
//!                       ├── text/plain             ├── multipart/alternative
//!                       └── text/html              │   ├── text/plain
//!                                                  │   └── text/html
//!                                                  └── application/...
//! ```

use crate::content_type::ContentType;
use crate::defaults::{DefaultHeaders, transfer_encoding_header};
use crate::encoding::{TransferEncoding, encode_base64_wrapped, encode_rfc2047};
use crate::error::{Error, Result};
use crate::header::{CRLF, HeaderField, names};
use crate::part::ContentPart;

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    filename: String,
    content_type: ContentType,
    data: Vec<u8>,
}

impl Attachment {
    /// Creates an `application/octet-stream` attachment.
    #[must_use]
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            content_type: ContentType::octet_stream(),
            data: data.into(),
        }
    }

    /// Overrides the media type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// The file name.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The raw file bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn into_part(self) -> ContentPart {
        let filename = header_safe(&self.filename);
        let content_type = self.content_type.with_parameter("name", filename.as_str());
        let disposition = HeaderField::new(
            names::CONTENT_DISPOSITION,
            ["attachment".to_string(), format!("filename={filename}")],
        );
        let body = format!("{CRLF}{}", encode_base64_wrapped(&self.data));

        ContentPart::leaf(
            vec![
                content_type.to_header(),
                transfer_encoding_header(TransferEncoding::Base64),
                disposition,
            ],
            body,
        )
    }
}

/// Builds the content tree of one outgoing message.
///
/// # Example
///
/// ```
/// use mailtree_mime::{DefaultHeaders, MessageComposer, encode_to_string};
///
/// let defaults = DefaultHeaders::default();
/// let tree = MessageComposer::new(&defaults)
///     .from("sender@example.com")
///     .to(["recipient@example.com"])
///     .subject("Hello")
///     .text("Plain text version")
///     .html("<p>HTML version</p>")
///     .build()
///     .unwrap();
///
/// let wire = encode_to_string(&tree);
/// assert!(wire.contains("multipart/alternative;boundary=main body"));
/// ```
#[derive(Debug, Clone)]
pub struct MessageComposer<'a> {
    defaults: &'a DefaultHeaders,
    from: Option<String>,
    to: Vec<String>,
    date: Option<String>,
    subject: Option<String>,
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
}

impl<'a> MessageComposer<'a> {
    /// Creates an empty composer using `defaults` for every part it creates.
    #[must_use]
    pub const fn new(defaults: &'a DefaultHeaders) -> Self {
        Self {
            defaults,
            from: None,
            to: Vec::new(),
            date: None,
            subject: None,
            text: None,
            html: None,
            attachments: Vec::new(),
        }
    }

    /// Sets the `From` header.
    #[must_use]
    pub fn from(mut self, from: impl Into<String>) -> Self {
        self.from = Some(from.into());
        self
    }

    /// Adds recipients to the `To` header.
    #[must_use]
    pub fn to<I, S>(mut self, recipients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.to.extend(recipients.into_iter().map(Into::into));
        self
    }

    /// Sets the `Date` header value, already formatted.
    #[must_use]
    pub fn date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Sets the `Subject` header. Non-ASCII subjects are RFC 2047 encoded.
    #[must_use]
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the plain-text body.
    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the HTML body.
    #[must_use]
    pub fn html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }

    /// Adds an attachment. An attachment with the same file name as an
    /// earlier one replaces it in place.
    #[must_use]
    pub fn attach(mut self, attachment: Attachment) -> Self {
        match self
            .attachments
            .iter_mut()
            .find(|a| a.filename == attachment.filename)
        {
            Some(existing) => *existing = attachment,
            None => self.attachments.push(attachment),
        }
        self
    }

    /// Assembles the content tree. The outermost content part is merged
    /// into the root, whose headers are the message headers followed by the
    /// content's own.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyContent`] if no text, HTML or attachment was
    /// supplied.
    pub fn build(self) -> Result<ContentPart> {
        let mut headers = Vec::with_capacity(8);
        if let Some(from) = &self.from {
            headers.push(HeaderField::new(names::FROM, [header_safe(from)]));
        }
        if !self.to.is_empty() {
            headers.push(HeaderField::new(names::TO, [format_address_list(&self.to)]));
        }
        if let Some(date) = &self.date {
            headers.push(HeaderField::new(names::DATE, [header_safe(date)]));
        }
        if let Some(subject) = &self.subject {
            headers.push(HeaderField::new(
                names::SUBJECT,
                [encode_rfc2047(subject, "utf-8")],
            ));
        }
        headers.push(self.defaults.mime_version_header());

        let (content_headers, body, children) = self.content()?.into_parts();
        headers.extend(content_headers);

        let mut root = ContentPart::leaf(headers, body);
        children.into_iter().for_each(|child| root.append_child(child));
        Ok(root)
    }

    fn content(self) -> Result<ContentPart> {
        let defaults = self.defaults;
        let text = non_empty(self.text).map(|text| {
            ContentPart::leaf(
                defaults.text_headers(),
                leaf_body(defaults.text_encoding, &text),
            )
        });
        let html = non_empty(self.html).map(|html| {
            ContentPart::leaf(
                defaults.html_headers(),
                leaf_body(defaults.html_encoding, &html),
            )
        });

        let body = match (text, html) {
            (Some(text), Some(html)) => Some(
                ContentPart::new()
                    .with_header(
                        ContentType::multipart_alternative(defaults.alternative_boundary.as_str())
                            .to_header(),
                    )
                    .with_child(text)
                    .with_child(html),
            ),
            (text, html) => text.or(html),
        };

        let attachment_count = self.attachments.len();
        let mut attachments = self.attachments.into_iter().map(Attachment::into_part);

        let content = match (body, attachment_count) {
            (None, 0) => return Err(Error::EmptyContent),
            (Some(body), 0) => body,
            (None, 1) => attachments.next().ok_or(Error::EmptyContent)?,
            (body, _) => {
                let mut mixed = ContentPart::new().with_header(
                    ContentType::multipart_mixed(defaults.mixed_boundary.as_str()).to_header(),
                );
                if let Some(body) = body {
                    mixed.append_child(body);
                }
                attachments.for_each(|part| mixed.append_child(part));
                mixed
            }
        };

        tracing::debug!(
            parts = content.len(),
            attachments = attachment_count,
            "composed message content"
        );
        Ok(content)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Leaf bodies open with the CRLF that ends their part's header block.
fn leaf_body(encoding: TransferEncoding, text: &str) -> String {
    format!("{CRLF}{}", encoding.apply(text))
}

/// Replaces control characters so a value cannot end its header line.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn format_address_list(addresses: &[String]) -> String {
    addresses
        .iter()
        .map(|address| header_safe(address))
        .collect::<Vec<_>>()
        .join(", ")
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
    use crate::encode::encode_to_string;

    fn composer(defaults: &DefaultHeaders) -> MessageComposer<'_> {
        MessageComposer::new(defaults)
            .from("sender@example.com")
            .to(["a@example.com", "b@example.com"])
            .date("Mon, 19 Oct 2026 10:00:00 +0000")
            .subject("Greetings")
    }

    fn content_type_lines(wire: &str) -> Vec<&str> {
        wire.split("\r\n")
            .filter(|line| line.starts_with("Content-Type: "))
            .collect()
    }

    #[test]
    fn test_empty_content() {
        let defaults = DefaultHeaders::default();
        let err = composer(&defaults).build().unwrap_err();
        assert_eq!(err, Error::EmptyContent);

        let err = composer(&defaults).text("").html("").build().unwrap_err();
        assert_eq!(err, Error::EmptyContent);
    }

    #[test]
    fn test_text_only_is_single_part() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults).text("hi").build().unwrap();
        assert_eq!(tree.depth(), 1);
        let wire = encode_to_string(&tree);

        let expected = [
            "From: sender@example.com\r\n",
            "To: a@example.com, b@example.com\r\n",
            "Date: Mon, 19 Oct 2026 10:00:00 +0000\r\n",
            "Subject: Greetings\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: text/plain;charset=utf-8\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "hi",
        ]
        .concat();
        assert_eq!(wire, expected);
    }

    #[test]
    fn test_text_and_html_alternative() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults)
            .text("hi")
            .html("<p>hi</p>")
            .build()
            .unwrap();

        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.depth(), 2);

        let wire = encode_to_string(&tree);
        assert!(wire.contains(
            "MIME-Version: 1.0\r\nContent-Type: multipart/alternative;boundary=main body\r\n\r\n--main body\r\n"
        ));
        assert!(wire.contains("\r\n\r\nhi\r\n--main body\r\n"));
        assert!(wire.ends_with("\r\n\r\n<p>hi</p>\r\n--main body--\r\n"));
        assert_eq!(wire.matches("\r\n--main body\r\n").count(), 2);
    }

    #[test]
    fn test_text_html_attachment_three_levels() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults)
            .text("hi")
            .html("<p>hi</p>")
            .attach(Attachment::new("a.bin", b"hello".to_vec()))
            .build()
            .unwrap();

        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.children().len(), 2);
        assert_eq!(tree.children()[0].children().len(), 2);
        assert_eq!(
            tree.content_types().next().unwrap().values(),
            ["multipart/mixed", "boundary=mixed body"]
        );

        let wire = encode_to_string(&tree);
        assert_eq!(
            content_type_lines(&wire),
            [
                "Content-Type: multipart/mixed;boundary=mixed body",
                "Content-Type: multipart/alternative;boundary=main body",
                "Content-Type: text/plain;charset=utf-8",
                "Content-Type: text/html;charset=utf-8",
                "Content-Type: application/octet-stream;name=a.bin",
            ]
        );
        assert!(wire.contains(
            "Content-Transfer-Encoding: base64\r\nContent-Disposition: attachment;filename=a.bin\r\n\r\naGVsbG8="
        ));
        assert!(wire.ends_with("\r\n--mixed body--\r\n"));
        assert_eq!(wire.matches("\r\n--mixed body\r\n").count(), 2);
    }

    #[test]
    fn test_single_attachment_is_not_wrapped() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults)
            .attach(Attachment::new("a.bin", b"x".to_vec()))
            .build()
            .unwrap();
        assert_eq!(tree.depth(), 1);
        let wire = encode_to_string(&tree);
        assert!(!wire.contains("multipart"));
        assert!(wire.ends_with("\r\n\r\neA=="));
    }

    #[test]
    fn test_attachments_only_use_mixed() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults)
            .attach(Attachment::new("a.bin", b"x".to_vec()))
            .attach(Attachment::new("b.bin", b"y".to_vec()))
            .build()
            .unwrap();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.children().len(), 2);
    }

    #[test]
    fn test_same_filename_replaces() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults)
            .text("t")
            .attach(Attachment::new("a.bin", b"old".to_vec()))
            .attach(Attachment::new("b.bin", b"b".to_vec()))
            .attach(Attachment::new("a.bin", b"new".to_vec()))
            .build()
            .unwrap();

        assert_eq!(tree.children().len(), 3);
        let wire = encode_to_string(&tree);
        assert!(wire.contains(&encode_base64_wrapped(b"new")));
        assert!(!wire.contains(&encode_base64_wrapped(b"old")));
        assert!(wire.find("name=a.bin").unwrap() < wire.find("name=b.bin").unwrap());
    }

    #[test]
    fn test_attachment_content_type() {
        let defaults = DefaultHeaders::default();
        let pdf = Attachment::new("r.pdf", b"%PDF".to_vec())
            .with_content_type(ContentType::parse("application/pdf").unwrap());
        let tree = composer(&defaults).text("t").attach(pdf).build().unwrap();
        assert!(encode_to_string(&tree).contains("Content-Type: application/pdf;name=r.pdf\r\n"));
    }

    #[test]
    fn test_custom_defaults() {
        let defaults = DefaultHeaders {
            text_encoding: TransferEncoding::EightBit,
            alternative_boundary: "alt-1".to_string(),
            ..DefaultHeaders::default()
        };
        let tree = composer(&defaults)
            .text("héllo")
            .html("<b>x</b>")
            .build()
            .unwrap();
        let wire = encode_to_string(&tree);
        assert!(wire.contains("Content-Transfer-Encoding: 8bit\r\n\r\nhéllo"));
        assert!(wire.ends_with("\r\n--alt-1--\r\n"));
    }

    #[test]
    fn test_non_ascii_subject_encoded() {
        let defaults = DefaultHeaders::default();
        let tree = MessageComposer::new(&defaults)
            .subject("Héllo")
            .text("x")
            .build()
            .unwrap();
        assert!(encode_to_string(&tree).starts_with("Subject: =?utf-8?B?SMOpbGxv?=\r\n"));
    }

    #[test]
    fn test_missing_optional_headers_are_skipped() {
        let defaults = DefaultHeaders::default();
        let tree = MessageComposer::new(&defaults).text("x").build().unwrap();
        assert!(encode_to_string(&tree).starts_with("MIME-Version: 1.0\r\nContent-Type: text/plain"));
    }

    #[test]
    fn test_subject_line_break_cannot_inject_header() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults)
            .subject("hi\r\nBcc: evil@example.com")
            .text("x")
            .build()
            .unwrap();
        let wire = encode_to_string(&tree);
        assert!(!wire.contains("\r\nBcc:"));
        assert!(wire.contains("Subject: =?utf-8?B?"));
    }

    #[test]
    fn test_attachment_filename_line_break_cannot_inject_header() {
        let defaults = DefaultHeaders::default();
        let tree = composer(&defaults)
            .text("x")
            .attach(Attachment::new("a.bin\r\nBcc: evil@example.com", b"x".to_vec()))
            .build()
            .unwrap();
        let wire = encode_to_string(&tree);
        assert!(!wire.contains("\r\nBcc:"));
        assert!(wire.contains("filename=a.bin  Bcc: evil@example.com\r\n"));
    }

    #[test]
    fn test_address_line_break_cannot_inject_header() {
        let defaults = DefaultHeaders::default();
        let tree = MessageComposer::new(&defaults)
            .from("a@example.com\r\nBcc: evil@example.com")
            .to(["b@example.com\nX-Evil: 1"])
            .text("x")
            .build()
            .unwrap();
        let wire = encode_to_string(&tree);
        assert!(!wire.contains("\r\nBcc:"));
        assert!(!wire.contains("\nX-Evil:"));
    }
}
