//! Content tree serialization.
//!
//! Encoding is depth-first and pre-order. For each part:
//!
//! 1. every header line, in declared order;
//! 2. the body, verbatim;
//! 3. for each child, `CRLF --token CRLF` (when this part declares a
//!    boundary) followed by the child's own encoding;
//! 4. `CRLF --token-- CRLF` when this part declares a boundary.
//!
//! The delimiter in front of a part is written exactly once, by its parent.

use crate::boundary::{BoundaryMap, Cursor};
use crate::error::Result;
use crate::header::CRLF;
use crate::part::ContentPart;

/// Encodes a content tree into its wire bytes.
///
/// Never fails: a malformed boundary attribute is logged and the part is
/// treated as declaring no boundary.
#[must_use]
pub fn encode(root: &ContentPart) -> Vec<u8> {
    encode_with(root, &BoundaryMap::resolve(root))
}

/// Encodes a content tree, rejecting malformed boundary attributes.
///
/// # Errors
///
/// Returns [`crate::Error::MalformedBoundary`] if any part carries a
/// boundary attribute that cannot be used.
pub fn encode_strict(root: &ContentPart) -> Result<Vec<u8>> {
    let map = BoundaryMap::resolve_strict(root)?;
    Ok(encode_with(root, &map))
}

/// Encodes a content tree into a `String`.
#[must_use]
pub fn encode_to_string(root: &ContentPart) -> String {
    // Every fragment written is a `&str`, so the buffer is valid UTF-8.
    String::from_utf8_lossy(&encode(root)).into_owned()
}

fn encode_with(root: &ContentPart, map: &BoundaryMap) -> Vec<u8> {
    let mut buf = Vec::new();
    write_part(root, map.cursor(), &mut buf);
    tracing::trace!(parts = root.len(), bytes = buf.len(), "encoded content tree");
    buf
}

fn write_part(part: &ContentPart, cursor: Cursor<'_>, buf: &mut Vec<u8>) {
    for header in part.headers() {
        header.write_to(buf);
    }

    buf.extend_from_slice(part.body().as_bytes());

    let delimiters = cursor.delimiters();
    for (index, child) in part.children().iter().enumerate() {
        if let Some(separator) = &delimiters.separator {
            write_delimiter(buf, separator);
        }
        if let Some(child_cursor) = cursor.child(index) {
            write_part(child, child_cursor, buf);
        }
    }

    if let Some(end) = &delimiters.end {
        write_delimiter(buf, end);
    }
}

fn write_delimiter(buf: &mut Vec<u8>, delimiter: &str) {
    buf.extend_from_slice(CRLF.as_bytes());
    buf.extend_from_slice(delimiter.as_bytes());
    buf.extend_from_slice(CRLF.as_bytes());
}

impl ContentPart {
    /// Encodes this part and its subtree. See [`encode`].
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
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
    use crate::header::HeaderField;
    use proptest::prelude::*;

    fn text(body: &str) -> ContentPart {
        ContentPart::new()
            .with_header(HeaderField::new("Content-Type", ["text/plain", "charset=utf-8"]))
            .with_body(body)
    }

    fn html(body: &str) -> ContentPart {
        ContentPart::new()
            .with_header(HeaderField::new("Content-Type", ["text/html", "charset=utf-8"]))
            .with_body(body)
    }

    fn container(subtype: &str, boundary: &str) -> ContentPart {
        ContentPart::new().with_header(HeaderField::new(
            "Content-Type",
            [format!("multipart/{subtype}"), format!("boundary={boundary}")],
        ))
    }

    fn count(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    #[test]
    fn test_leaf_body_verbatim() {
        let out = encode_to_string(&text("hello\r\nworld"));
        assert_eq!(
            out,
            "Content-Type: text/plain;charset=utf-8\r\nhello\r\nworld"
        );
        assert!(!out.contains("--"));
    }

    #[test]
    fn test_empty_leaf_is_headers_only() {
        let part = ContentPart::new()
            .with_header(HeaderField::new("Subject", ["Hello"]))
            .with_header(HeaderField::new("MIME-Version", ["1.0"]));
        assert_eq!(
            encode_to_string(&part),
            "Subject: Hello\r\nMIME-Version: 1.0\r\n"
        );
    }

    #[test]
    fn test_header_without_values_is_skipped() {
        let part = ContentPart::new()
            .with_header(HeaderField::new("Subject", ["Hello"]))
            .with_header(HeaderField::new("X-Empty", Vec::<String>::new()));
        assert_eq!(encode_to_string(&part), "Subject: Hello\r\n");
    }

    #[test]
    fn test_alternative_scenario() {
        let root = container("alternative", "main body")
            .with_child(text("hi"))
            .with_child(html("<p>hi</p>"));

        let expected = [
            "Content-Type: multipart/alternative;boundary=main body\r\n",
            "\r\n--main body\r\n",
            "Content-Type: text/plain;charset=utf-8\r\nhi",
            "\r\n--main body\r\n",
            "Content-Type: text/html;charset=utf-8\r\n<p>hi</p>",
            "\r\n--main body--\r\n",
        ]
        .concat();

        assert_eq!(encode_to_string(&root), expected);
    }

    #[test]
    fn test_nested_containers() {
        let root = ContentPart::new()
            .with_header(HeaderField::new("Subject", ["nested"]))
            .with_child(
                container("mixed", "outer")
                    .with_child(
                        container("alternative", "inner")
                            .with_child(text("t"))
                            .with_child(html("h")),
                    )
                    .with_child(
                        ContentPart::new()
                            .with_header(HeaderField::new(
                                "Content-Type",
                                ["application/octet-stream", "name=a.bin"],
                            ))
                            .with_body("AAAA"),
                    ),
            );

        let out = encode_to_string(&root);
        let expected = [
            "Subject: nested\r\n",
            "Content-Type: multipart/mixed;boundary=outer\r\n",
            "\r\n--outer\r\n",
            "Content-Type: multipart/alternative;boundary=inner\r\n",
            "\r\n--inner\r\n",
            "Content-Type: text/plain;charset=utf-8\r\nt",
            "\r\n--inner\r\n",
            "Content-Type: text/html;charset=utf-8\r\nh",
            "\r\n--inner--\r\n",
            "\r\n--outer\r\n",
            "Content-Type: application/octet-stream;name=a.bin\r\nAAAA",
            "\r\n--outer--\r\n",
        ]
        .concat();
        assert_eq!(out, expected);
        assert_eq!(count(&out, "--outer--"), 1);
        assert_eq!(count(&out, "--inner--"), 1);
    }

    #[test]
    fn test_container_body_is_preamble() {
        let root = container("mixed", "b")
            .with_body("preamble")
            .with_child(text("x"));
        let out = encode_to_string(&root);
        assert!(out.starts_with("Content-Type: multipart/mixed;boundary=b\r\npreamble\r\n--b\r\n"));
        assert_eq!(count(&out, "\r\n--b\r\n"), 1);
    }

    #[test]
    fn test_container_without_children_still_closes() {
        let out = encode_to_string(&container("mixed", "lonely"));
        assert_eq!(
            out,
            "Content-Type: multipart/mixed;boundary=lonely\r\n\r\n--lonely--\r\n"
        );
    }

    #[test]
    fn test_children_without_boundary_are_concatenated() {
        let root = ContentPart::new()
            .with_header(HeaderField::new("Subject", ["s"]))
            .with_child(text("only"));
        assert_eq!(
            encode_to_string(&root),
            "Subject: s\r\nContent-Type: text/plain;charset=utf-8\r\nonly"
        );
    }

    #[test]
    fn test_malformed_boundary_lenient_and_strict() {
        let root = ContentPart::new()
            .with_header(HeaderField::new("Content-Type", ["multipart/mixed", "boundary"]))
            .with_child(text("a"));

        let out = encode_to_string(&root);
        assert_eq!(
            out,
            "Content-Type: multipart/mixed;boundary\r\nContent-Type: text/plain;charset=utf-8\r\na"
        );
        assert!(encode_strict(&root).is_err());
    }

    #[test]
    fn test_strict_matches_lenient_on_valid_tree() {
        let root = container("alternative", "ok").with_child(text("a"));
        assert_eq!(encode_strict(&root).unwrap(), encode(&root));
    }

    #[test]
    fn test_quoted_boundary() {
        let root = ContentPart::new()
            .with_header(HeaderField::new(
                "Content-Type",
                ["multipart/mixed", "boundary=\"q-1\""],
            ))
            .with_child(text("a"));
        let out = encode_to_string(&root);
        assert!(out.contains("\r\n--q-1\r\n"));
        assert!(out.ends_with("\r\n--q-1--\r\n"));
    }

    fn leaf_strategy() -> impl Strategy<Value = ContentPart> {
        "[a-z ]{0,12}".prop_map(|body| text(&body))
    }

    fn tree_strategy() -> impl Strategy<Value = ContentPart> {
        leaf_strategy().prop_recursive(3, 32, 4, |inner| {
            (prop::collection::vec(inner, 0..4), "[a-z]{1,8}").prop_map(|(children, token)| {
                children
                    .into_iter()
                    .fold(container("mixed", &format!("b-{token}")), ContentPart::with_child)
            })
        })
    }

    proptest! {
        #[test]
        fn prop_encoding_is_idempotent(tree in tree_strategy()) {
            prop_assert_eq!(encode(&tree), encode(&tree));
        }

        #[test]
        fn prop_container_decomposes(tree in tree_strategy()) {
            let mut expected = Vec::new();
            for header in tree.headers() {
                header.write_to(&mut expected);
            }
            expected.extend_from_slice(tree.body().as_bytes());
            let token = crate::boundary::boundary_token(&tree).map(str::to_string);
            for child in tree.children() {
                if let Some(token) = &token {
                    expected.extend_from_slice(format!("\r\n--{token}\r\n").as_bytes());
                }
                expected.extend_from_slice(&encode(child));
            }
            if let Some(token) = &token {
                expected.extend_from_slice(format!("\r\n--{token}--\r\n").as_bytes());
            }
            prop_assert_eq!(encode(&tree), expected);
        }

        #[test]
        fn prop_one_delimiter_per_child(
            bodies in prop::collection::vec("[a-z ]{0,12}", 1..8),
            token in "[a-z]{3,10}",
        ) {
            let boundary = format!("x{token}");
            let root = bodies
                .iter()
                .fold(container("mixed", &boundary), |root, body| root.with_child(text(body)));
            let out = encode_to_string(&root);

            prop_assert_eq!(count(&out, &format!("\r\n--{boundary}\r\n")), bodies.len());
            prop_assert_eq!(count(&out, &format!("--{boundary}--")), 1);
            let closing = format!("\r\n--{boundary}--\r\n");
            prop_assert!(out.ends_with(&closing));
        }
    }
}
