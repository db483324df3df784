//! Boundary resolution.
//!
//! A part declares itself a multipart container by carrying a
//! `Content-Type` header with a `boundary=<token>` attribute. Resolution is a
//! single top-down pass over the tree that records, for every part, the
//! delimiter its parent writes before it and the closing marker it writes
//! after its own children. The tree itself is never modified.

use crate::error::{Error, Result};
use crate::header::{HeaderField, names};
use crate::part::ContentPart;
use std::convert::Infallible;

/// Literal prefix of a boundary attribute.
pub const BOUNDARY_PREFIX: &str = "boundary=";

/// RFC 2046 limit on boundary length.
pub const MAX_BOUNDARY_LEN: usize = 70;

/// Inspects one `Content-Type` attribute.
///
/// Returns `None` when the attribute is not a boundary declaration at all,
/// `Some(Ok(token))` for a usable one and `Some(Err(_))` for an attribute
/// that names a boundary but cannot be used. Leading whitespace is ignored
/// and a token wrapped in double quotes is unquoted.
#[must_use]
pub fn parse_boundary_attr(attr: &str) -> Option<Result<&str>> {
    let attr = attr.trim_start();
    if !attr.starts_with("boundary") {
        return None;
    }

    let malformed = |reason| {
        Some(Err(Error::MalformedBoundary {
            attribute: attr.to_string(),
            reason,
        }))
    };

    let Some(raw) = attr.strip_prefix(BOUNDARY_PREFIX) else {
        return malformed("expected `boundary=`");
    };
    let token = raw
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(raw);

    if token.is_empty() {
        return malformed("empty token");
    }
    if token.chars().count() > MAX_BOUNDARY_LEN {
        return malformed("token longer than 70 characters");
    }
    if token.ends_with(' ') {
        return malformed("token ends with a space");
    }
    Some(Ok(token))
}

/// Returns the first usable boundary token declared by `part`, skipping
/// malformed declarations with a warning.
#[must_use]
pub fn boundary_token(part: &ContentPart) -> Option<&str> {
    declared_boundary(part.headers())
}

/// Returns the first usable boundary token among the `Content-Type`
/// headers in `headers`, skipping malformed declarations with a warning.
pub(crate) fn declared_boundary(headers: &[HeaderField]) -> Option<&str> {
    for header in headers.iter().filter(|h| h.is(names::CONTENT_TYPE)) {
        for attr in header.values() {
            match parse_boundary_attr(attr) {
                Some(Ok(token)) => return Some(token),
                Some(Err(e)) => tracing::warn!(%e, "ignoring boundary attribute"),
                None => {}
            }
        }
    }
    None
}

/// Like [`boundary_token`], but fails on the first malformed declaration.
///
/// # Errors
///
/// Returns [`Error::MalformedBoundary`] for a boundary attribute that cannot
/// be used.
pub fn boundary_token_strict(part: &ContentPart) -> Result<Option<&str>> {
    for header in part.content_types() {
        for attr in header.values() {
            if let Some(token) = parse_boundary_attr(attr) {
                return token.map(Some);
            }
        }
    }
    Ok(None)
}

/// Delimiters resolved for a single part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delimiters {
    /// `--token` of the parent's boundary, written before this part.
    pub start: Option<String>,
    /// `--token` of this part's own boundary, written before each child.
    pub separator: Option<String>,
    /// `--token--`, written after this part's last child.
    pub end: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    delimiters: Delimiters,
    children: Vec<Node>,
}

/// Delimiters for every part of a tree, addressed by child-index path.
///
/// The empty path addresses the root; `[1, 0]` addresses the first child
/// of the root's second child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryMap {
    root: Node,
}

impl BoundaryMap {
    /// Resolves delimiters for `root`. Malformed boundary attributes are
    /// logged and treated as absent.
    #[must_use]
    pub fn resolve(root: &ContentPart) -> Self {
        let resolved = resolve_node(root, None, &|part| {
            Ok::<_, Infallible>(boundary_token(part))
        });
        match resolved {
            Ok(root) => Self { root },
            Err(never) => match never {},
        }
    }

    /// Resolves delimiters for `root`, rejecting malformed boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedBoundary`] for the first malformed
    /// boundary attribute found in pre-order.
    pub fn resolve_strict(root: &ContentPart) -> Result<Self> {
        let root = resolve_node(root, None, &boundary_token_strict)?;
        Ok(Self { root })
    }

    /// Delimiters of the part at `path`, if the path exists.
    #[must_use]
    pub fn get(&self, path: &[usize]) -> Option<&Delimiters> {
        let mut node = &self.root;
        for &index in path {
            node = node.children.get(index)?;
        }
        Some(&node.delimiters)
    }

    /// Delimiters of the root part.
    #[must_use]
    pub const fn root(&self) -> &Delimiters {
        &self.root.delimiters
    }

    pub(crate) fn cursor(&self) -> Cursor<'_> {
        Cursor { node: &self.root }
    }
}

/// Walks a [`BoundaryMap`] in step with the part tree it was resolved from.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    node: &'a Node,
}

impl<'a> Cursor<'a> {
    pub(crate) const fn delimiters(self) -> &'a Delimiters {
        &self.node.delimiters
    }

    pub(crate) fn child(self, index: usize) -> Option<Self> {
        self.node.children.get(index).map(|node| Self { node })
    }
}

fn resolve_node<'p, E, F>(
    part: &'p ContentPart,
    start: Option<String>,
    declared: &F,
) -> std::result::Result<Node, E>
where
    F: Fn(&'p ContentPart) -> std::result::Result<Option<&'p str>, E>,
{
    let token = declared(part)?;
    let separator = token.map(|t| format!("--{t}"));
    let end = token.map(|t| format!("--{t}--"));

    let children = part
        .children()
        .iter()
        .map(|child| resolve_node(child, separator.clone(), declared))
        .collect::<std::result::Result<Vec<_>, E>>()?;

    Ok(Node {
        delimiters: Delimiters {
            start,
            separator,
            end,
        },
        children,
    })
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

    fn container(boundary: &str) -> ContentPart {
        ContentPart::new().with_header(HeaderField::new(
            "Content-Type",
            ["multipart/alternative".to_string(), format!("boundary={boundary}")],
        ))
    }

    #[test]
    fn test_parse_boundary_attr() {
        assert_eq!(parse_boundary_attr("boundary=abc").unwrap().unwrap(), "abc");
        assert_eq!(
            parse_boundary_attr("boundary=main body").unwrap().unwrap(),
            "main body"
        );
        assert_eq!(
            parse_boundary_attr(" boundary=\"--123--\"").unwrap().unwrap(),
            "--123--"
        );
        assert!(parse_boundary_attr("charset=utf-8").is_none());
        assert!(parse_boundary_attr("text/plain").is_none());
    }

    #[test]
    fn test_parse_boundary_attr_malformed() {
        assert!(parse_boundary_attr("boundary").unwrap().is_err());
        assert!(parse_boundary_attr("boundary:abc").unwrap().is_err());
        assert!(parse_boundary_attr("boundary=").unwrap().is_err());
        assert!(parse_boundary_attr("boundary=\"\"").unwrap().is_err());
        assert!(parse_boundary_attr("boundary=trailing ").unwrap().is_err());

        let long = format!("boundary={}", "x".repeat(71));
        assert!(parse_boundary_attr(&long).unwrap().is_err());
    }

    #[test]
    fn test_boundary_length_counts_characters() {
        let token = "é".repeat(36);
        assert_eq!(token.len(), 72);
        let attr = format!("boundary={token}");
        assert_eq!(parse_boundary_attr(&attr).unwrap().unwrap(), token);

        let attr = format!("boundary={}", "é".repeat(71));
        assert!(parse_boundary_attr(&attr).unwrap().is_err());
    }

    #[test]
    fn test_boundary_only_from_content_type() {
        let part = ContentPart::new().with_header(HeaderField::new("X-Other", ["boundary=abc"]));
        assert!(boundary_token(&part).is_none());
    }

    #[test]
    fn test_lenient_skips_malformed() {
        let part = ContentPart::new().with_header(HeaderField::new(
            "Content-Type",
            ["multipart/mixed", "boundary", "boundary=ok"],
        ));
        assert_eq!(boundary_token(&part), Some("ok"));
        assert!(boundary_token_strict(&part).is_err());
    }

    #[test]
    fn test_resolve_assigns_children() {
        let root = container("outer")
            .with_child(ContentPart::new().with_body("a"))
            .with_child(container("inner").with_child(ContentPart::new().with_body("b")));

        let map = BoundaryMap::resolve(&root);

        let top = map.root();
        assert_eq!(top.start, None);
        assert_eq!(top.separator.as_deref(), Some("--outer"));
        assert_eq!(top.end.as_deref(), Some("--outer--"));

        let first = map.get(&[0]).unwrap();
        assert_eq!(first.start.as_deref(), Some("--outer"));
        assert_eq!(first.end, None);

        let nested = map.get(&[1]).unwrap();
        assert_eq!(nested.start.as_deref(), Some("--outer"));
        assert_eq!(nested.end.as_deref(), Some("--inner--"));

        let leaf = map.get(&[1, 0]).unwrap();
        assert_eq!(leaf.start.as_deref(), Some("--inner"));

        assert!(map.get(&[2]).is_none());
    }

    #[test]
    fn test_part_without_declaration_keeps_parent_start() {
        let root = container("x").with_child(
            ContentPart::new()
                .with_header(HeaderField::new("Content-Type", ["text/plain"]))
                .with_child(ContentPart::new().with_body("deep")),
        );
        let map = BoundaryMap::resolve(&root);

        assert_eq!(map.get(&[0]).unwrap().start.as_deref(), Some("--x"));
        assert_eq!(map.get(&[0]).unwrap().separator, None);
        assert_eq!(map.get(&[0, 0]).unwrap().start, None);
    }

    #[test]
    fn test_resolve_strict_reports_nested_error() {
        let root = container("ok").with_child(
            ContentPart::new()
                .with_header(HeaderField::new("Content-Type", ["multipart/mixed", "boundary="])),
        );
        assert!(BoundaryMap::resolve_strict(&root).is_err());
        assert!(BoundaryMap::resolve(&root).get(&[0]).unwrap().end.is_none());
    }
}
