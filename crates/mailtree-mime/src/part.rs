//! Content part tree.

use crate::header::{HeaderField, names};

/// One node of a MIME body: its headers, an optional literal body and an
/// ordered list of child parts.
///
/// The tree is declarative. Boundary delimiters are not stored on the part;
/// they are derived from each part's `Content-Type` header when the tree is
/// encoded (see [`crate::BoundaryMap`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentPart {
    headers: Vec<HeaderField>,
    body: String,
    children: Vec<ContentPart>,
}

impl ContentPart {
    /// Creates an empty part.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a leaf part from headers and a body.
    #[must_use]
    pub fn leaf(headers: Vec<HeaderField>, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
            children: Vec::new(),
        }
    }

    /// Adds a header after the existing ones.
    #[must_use]
    pub fn with_header(mut self, header: HeaderField) -> Self {
        self.headers.push(header);
        self
    }

    /// Adds a header after the existing ones.
    pub fn push_header(&mut self, header: HeaderField) {
        self.headers.push(header);
    }

    /// Sets the literal body text.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets the literal body text.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Appends a child after the existing ones.
    pub fn append_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// Appends a child after the existing ones.
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(child);
        self
    }

    /// Headers in declared order.
    #[must_use]
    pub fn headers(&self) -> &[HeaderField] {
        &self.headers
    }

    /// The literal body text (possibly empty).
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Child parts in append order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// Returns true if the part has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Iterates over this part's `Content-Type` headers.
    pub fn content_types(&self) -> impl Iterator<Item = &HeaderField> {
        self.headers.iter().filter(|h| h.is(names::CONTENT_TYPE))
    }

    /// Number of levels in the subtree rooted here; a leaf has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// Splits the part into its headers, body and children.
    #[must_use]
    pub fn into_parts(self) -> (Vec<HeaderField>, String, Vec<Self>) {
        (self.headers, self.body, self.children)
    }

    /// Number of parts in the subtree rooted here, including this one.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(Self::len).sum::<usize>()
    }

    /// Always false: a tree contains at least its root.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_methods() {
        let part = ContentPart::new()
            .with_header(HeaderField::new("Content-Type", ["text/plain"]))
            .with_body("hi");

        assert_eq!(part.headers().len(), 1);
        assert_eq!(part.body(), "hi");
        assert!(part.is_leaf());
        assert_eq!(part.len(), 1);
    }

    #[test]
    fn test_append_child_keeps_order() {
        let mut root = ContentPart::new();
        root.append_child(ContentPart::new().with_body("a"));
        root.append_child(ContentPart::new().with_body("b"));
        root.append_child(ContentPart::new().with_body("c"));

        let bodies: Vec<_> = root.children().iter().map(ContentPart::body).collect();
        assert_eq!(bodies, ["a", "b", "c"]);
        assert_eq!(root.len(), 4);
        assert_eq!(root.depth(), 2);
    }

    #[test]
    fn test_depth_follows_deepest_branch() {
        let tree = ContentPart::new()
            .with_child(ContentPart::new())
            .with_child(ContentPart::new().with_child(ContentPart::new().with_body("x")));
        assert_eq!(tree.depth(), 3);
        assert_eq!(ContentPart::new().depth(), 1);
    }

    #[test]
    fn test_into_parts() {
        let part = ContentPart::new()
            .with_header(HeaderField::new("Content-Type", ["multipart/mixed"]))
            .with_body("preamble")
            .with_child(ContentPart::new());
        let (headers, body, children) = part.into_parts();
        assert_eq!(headers.len(), 1);
        assert_eq!(body, "preamble");
        assert_eq!(children.len(), 1);
    }

    #[test]
    fn test_content_types_filters_by_name() {
        let part = ContentPart::new()
            .with_header(HeaderField::new("Subject", ["x"]))
            .with_header(HeaderField::new("content-type", ["text/html"]));

        let found: Vec<_> = part.content_types().collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].values(), ["text/html"]);
    }
}
