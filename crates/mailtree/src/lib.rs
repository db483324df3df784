//! # mailtree
//!
//! Compose a multipart email from text, HTML and attachments, encode it with
//! `mailtree-mime` and deliver it through a [`Transport`].
//!
//! [`SmtpTransport`] delivers over SMTP with `mailtree-smtp`; any other
//! delivery mechanism (a queue, a test recorder) only has to implement
//! [`Transport::send_raw`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailtree::{Mailer, SmtpTransport};
//! use mailtree_smtp::{Config, Security};
//!
//! # async fn run() -> mailtree::Result<()> {
//! let config = Config::builder("smtp.example.com")
//!     .security(Security::Implicit)
//!     .credentials("me@example.com", "password")
//!     .build();
//!
//! let mut mailer = Mailer::new("me@example.com", SmtpTransport::new(config));
//! mailer.subject("Hello");
//! mailer.text("Hello in plain text");
//! mailer.html("<p>Hello in <b>HTML</b></p>");
//! mailer.send_email(&["friend@example.com"]).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod clock;
mod error;
mod mailer;
mod transport;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, Result};
pub use mailer::Mailer;
pub use transport::{BoxError, Envelope, SmtpTransport, Transport};

pub use mailtree_mime as mime;
pub use mailtree_smtp as smtp;
