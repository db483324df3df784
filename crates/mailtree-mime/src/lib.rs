//! # mailtree-mime
//!
//! MIME multipart tree model and encoder for outgoing email (RFC 2045/2046).
//!
//! ## Features
//!
//! - **Content tree**: [`ContentPart`] nodes with ordered headers, a literal
//!   body and ordered children, nested to any depth
//! - **Boundary resolution**: delimiters derived from each part's
//!   `Content-Type: ...;boundary=<token>` attribute
//! - **Encoding**: deterministic, depth-first serialization to CRLF wire bytes
//! - **Flat bodies**: a single-level [`FlatBody`] for callers that never nest
//! - **Composition**: [`MessageComposer`] builds text/HTML/attachment trees
//!
//! ## Quick Start
//!
//! ```
//! use mailtree_mime::{ContentPart, HeaderField, encode_to_string};
//!
//! let tree = ContentPart::new()
//!     .with_header(HeaderField::new(
//!         "Content-Type",
//!         ["multipart/alternative", "boundary=main body"],
//!     ))
//!     .with_child(
//!         ContentPart::new()
//!             .with_header(HeaderField::new("Content-Type", ["text/plain"]))
//!             .with_body("hi"),
//!     );
//!
//! let wire = encode_to_string(&tree);
//! assert!(wire.ends_with("\r\n--main body--\r\n"));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod boundary;
mod composer;
mod content_type;
mod defaults;
mod encode;
mod error;
mod flat;
mod header;
mod part;

pub mod encoding;

pub use boundary::{
    BOUNDARY_PREFIX, BoundaryMap, Delimiters, MAX_BOUNDARY_LEN, boundary_token,
    boundary_token_strict, parse_boundary_attr,
};
pub use composer::{Attachment, MessageComposer};
pub use content_type::ContentType;
pub use defaults::{DefaultHeaders, transfer_encoding_header};
pub use encode::{encode, encode_strict, encode_to_string};
pub use encoding::TransferEncoding;
pub use error::{Error, Result};
pub use flat::{Block, FlatBody};
pub use header::{CRLF, HeaderField, names};
pub use part::ContentPart;
