//! # mailtree-smtp
//!
//! A small async SMTP client (RFC 5321) used to deliver messages built with
//! `mailtree-mime`.
//!
//! ## Features
//!
//! - **Type-state connection management**: invalid command orders do not
//!   compile
//! - **TLS**: implicit TLS (port 465) and STARTTLS (port 587)
//! - **Authentication**: AUTH PLAIN
//! - **Timeouts** on connecting and on every server reply
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailtree_smtp::{Config, send_mail};
//!
//! # async fn run(message: &[u8]) -> mailtree_smtp::Result<()> {
//! let config = Config::builder("smtp.example.com")
//!     .credentials("user@example.com", "password")
//!     .build();
//!
//! send_mail(
//!     &config,
//!     "user@example.com",
//!     &["friend@example.com".to_string()],
//!     message,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The lower-level [`Client`] exposes each step of the session for callers
//! that need to reuse a connection.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod client;
pub mod command;
pub mod config;
mod error;
pub mod reply;
mod session;
pub mod stream;

pub use client::{Authenticated, Client, Connected, Data, MailTransaction, RecipientAdded};
pub use command::Command;
pub use config::{Config, ConfigBuilder, Credentials, Security};
pub use error::{Error, Result};
pub use reply::{Reply, ReplyCode};
pub use session::send_mail;
pub use stream::{SmtpStream, connect};
