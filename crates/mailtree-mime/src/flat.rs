//! Single-level multipart bodies.
//!
//! [`FlatBody`] is the non-recursive counterpart of a [`ContentPart`] tree:
//! one set of top-level headers and a list of leaf blocks that all share the
//! boundary declared by those headers. It needs no boundary resolution pass
//! and converts losslessly into a tree with [`ContentPart::from`].

use crate::boundary::declared_boundary;
use crate::header::{CRLF, HeaderField};
use crate::part::ContentPart;

/// A leaf block: headers followed by a blank line and the content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    headers: Vec<HeaderField>,
    content: String,
}

impl Block {
    /// Creates a block.
    #[must_use]
    pub fn new(headers: Vec<HeaderField>, content: impl Into<String>) -> Self {
        Self {
            headers,
            content: content.into(),
        }
    }

    /// Appends headers after the existing ones.
    pub fn set_headers(&mut self, headers: impl IntoIterator<Item = HeaderField>) {
        self.headers.extend(headers);
    }

    /// Replaces the content.
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        for header in &self.headers {
            header.write_to(buf);
        }
        buf.extend_from_slice(CRLF.as_bytes());
        buf.extend_from_slice(self.content.as_bytes());
    }
}

/// Top-level headers plus blocks separated by one shared boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatBody {
    headers: Vec<HeaderField>,
    blocks: Vec<Block>,
}

impl FlatBody {
    /// Creates a body from its top-level headers and blocks.
    #[must_use]
    pub fn new(headers: Vec<HeaderField>, blocks: Vec<Block>) -> Self {
        Self { headers, blocks }
    }

    /// Appends blocks after the existing ones.
    pub fn push(&mut self, blocks: impl IntoIterator<Item = Block>) {
        self.blocks.extend(blocks);
    }

    /// The blocks in append order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Encodes the body: headers, then each block behind `CRLF --token CRLF`,
    /// then `CRLF --token-- CRLF` after the last block. Without a boundary
    /// declaration the blocks are written back to back.
    ///
    /// A body with no blocks encodes to its headers alone. This is the one
    /// case where the output differs from the equivalent tree, whose empty
    /// container still writes its closing delimiter.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for header in &self.headers {
            header.write_to(&mut buf);
        }

        let token = self.boundary();
        for block in &self.blocks {
            if let Some(token) = token {
                buf.extend_from_slice(format!("{CRLF}--{token}{CRLF}").as_bytes());
            }
            block.write_to(&mut buf);
        }
        if let Some(token) = token.filter(|_| !self.blocks.is_empty()) {
            buf.extend_from_slice(format!("{CRLF}--{token}--{CRLF}").as_bytes());
        }

        buf
    }

    fn boundary(&self) -> Option<&str> {
        declared_boundary(&self.headers)
    }
}

impl From<Block> for ContentPart {
    fn from(block: Block) -> Self {
        Self::leaf(block.headers, format!("{CRLF}{}", block.content))
    }
}

impl From<FlatBody> for ContentPart {
    fn from(body: FlatBody) -> Self {
        body.blocks
            .into_iter()
            .fold(Self::leaf(body.headers, ""), |root, block| {
                root.with_child(block.into())
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;
    use crate::encode::encode;

    fn sample() -> FlatBody {
        let html = Block::new(
            vec![HeaderField::new("Content-Type", ["text/html", "charset=UTF-8"])],
            "<p>x</p>",
        );
        let mut text = Block::default();
        text.set_headers([HeaderField::new("Content-Type", ["text/plain"])]);
        text.set_content("x");

        FlatBody::new(
            vec![
                HeaderField::new("Subject", ["flat"]),
                HeaderField::new("Content-Type", ["multipart/mixed", "boundary=main body"]),
            ],
            vec![text, html],
        )
    }

    #[test]
    fn test_flat_encode() {
        let out = String::from_utf8(sample().encode()).unwrap();
        let expected = [
            "Subject: flat\r\n",
            "Content-Type: multipart/mixed;boundary=main body\r\n",
            "\r\n--main body\r\n",
            "Content-Type: text/plain\r\n\r\nx",
            "\r\n--main body\r\n",
            "Content-Type: text/html;charset=UTF-8\r\n\r\n<p>x</p>",
            "\r\n--main body--\r\n",
        ]
        .concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_flat_matches_tree() {
        let body = sample();
        assert_eq!(body.encode(), encode(&ContentPart::from(body.clone())));
    }

    #[test]
    fn test_flat_push() {
        let mut body = sample();
        body.push([Block::new(Vec::new(), "third")]);
        assert_eq!(body.blocks().len(), 3);

        let out = String::from_utf8(body.encode()).unwrap();
        assert_eq!(out.matches("\r\n--main body\r\n").count(), 3);
        assert_eq!(out.matches("--main body--").count(), 1);
    }

    #[test]
    fn test_flat_without_boundary() {
        let body = FlatBody::new(
            vec![HeaderField::new("Subject", ["plain"])],
            vec![Block::new(Vec::new(), "a"), Block::new(Vec::new(), "b")],
        );
        let out = String::from_utf8(body.encode()).unwrap();
        assert_eq!(out, "Subject: plain\r\n\r\na\r\nb");
    }

    #[test]
    fn test_flat_without_blocks_has_no_closing_marker() {
        let body = FlatBody::new(
            vec![HeaderField::new("Content-Type", ["multipart/mixed", "boundary=main body"])],
            Vec::new(),
        );
        let out = String::from_utf8(body.encode()).unwrap();
        assert_eq!(out, "Content-Type: multipart/mixed;boundary=main body\r\n");
    }
}
