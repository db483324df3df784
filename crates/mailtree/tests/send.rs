//! End-to-end tests for the mailer with an in-memory transport.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use mailtree::mime::{Block, FlatBody, HeaderField};
use mailtree::{BoxError, Envelope, Error, FixedClock, Mailer, Transport};

const DATE: &str = "Tue, 1 Oct 2024 09:30:00 +0200";

/// Keeps every message handed to it; optionally refuses them.
#[derive(Default)]
struct MemoryTransport {
    outbox: Mutex<Vec<(Envelope, Vec<u8>)>>,
    refuse: bool,
}

impl MemoryTransport {
    fn refusing() -> Self {
        Self {
            refuse: true,
            ..Self::default()
        }
    }

    fn messages(&self) -> Vec<String> {
        self.outbox
            .lock()
            .unwrap()
            .iter()
            .map(|(_, message)| String::from_utf8(message.clone()).unwrap())
            .collect()
    }
}

impl Transport for MemoryTransport {
    async fn send_raw(&self, envelope: &Envelope, message: &[u8]) -> Result<(), BoxError> {
        if self.refuse {
            return Err("mailbox unavailable".into());
        }
        self.outbox
            .lock()
            .unwrap()
            .push((envelope.clone(), message.to_vec()));
        Ok(())
    }
}

fn mailer(transport: MemoryTransport) -> Mailer<MemoryTransport> {
    Mailer::new("sender@example.com", transport).with_clock(FixedClock::new(DATE))
}

fn content_types(wire: &str) -> Vec<&str> {
    wire.split("\r\n")
        .filter(|line| line.starts_with("Content-Type: "))
        .collect()
}

#[tokio::test]
async fn test_text_html_and_attachment() {
    let mut mailer = mailer(MemoryTransport::default());
    mailer.subject("Quarterly numbers");
    mailer.text("See the attached report.");
    mailer.html("<p>See the attached report.</p>");
    mailer.attach("report.csv", b"q,total\n1,42\n".to_vec());

    mailer
        .send_email(&["a@example.com", "b@example.com"])
        .await
        .unwrap();

    let messages = mailer.transport().messages();
    assert_eq!(messages.len(), 1);
    let wire = &messages[0];

    assert!(wire.starts_with(&format!(
        "From: sender@example.com\r\nTo: a@example.com, b@example.com\r\nDate: {DATE}\r\nSubject: Quarterly numbers\r\nMIME-Version: 1.0\r\n"
    )));
    assert_eq!(
        content_types(wire),
        [
            "Content-Type: multipart/mixed;boundary=mixed body",
            "Content-Type: multipart/alternative;boundary=main body",
            "Content-Type: text/plain;charset=utf-8",
            "Content-Type: text/html;charset=utf-8",
            "Content-Type: application/octet-stream;name=report.csv",
        ]
    );
    assert_eq!(wire.matches("\r\n--mixed body\r\n").count(), 2);
    assert_eq!(wire.matches("\r\n--main body\r\n").count(), 2);
    assert!(wire.contains("\r\n--main body--\r\n\r\n--mixed body\r\n"));
    assert!(wire.ends_with("\r\n--mixed body--\r\n"));
    assert!(wire.contains("Content-Disposition: attachment;filename=report.csv\r\n"));
}

#[tokio::test]
async fn test_same_content_to_several_lists() {
    let mut mailer = mailer(MemoryTransport::default());
    mailer.text("hi");

    mailer.send_email(&["a@example.com"]).await.unwrap();
    mailer.send_email(&["b@example.com"]).await.unwrap();

    let outbox = mailer.transport().outbox.lock().unwrap().clone();
    assert_eq!(outbox[0].0.to(), ["a@example.com"]);
    assert_eq!(outbox[1].0.to(), ["b@example.com"]);

    let messages = mailer.transport().messages();
    assert_eq!(
        messages[0].replace("a@example.com", "b@example.com"),
        messages[1]
    );
}

#[tokio::test]
async fn test_transport_error_passes_through() {
    let mut mailer = mailer(MemoryTransport::refusing());
    mailer.text("hi");

    let err = mailer.send_email(&["a@example.com"]).await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(err.to_string(), "Transport failed: mailbox unavailable");
}

#[tokio::test]
async fn test_blank_recipients_are_missing() {
    let mut mailer = mailer(MemoryTransport::default());
    mailer.text("hi");

    let err = mailer.send_email(&["", "  "]).await.unwrap_err();
    assert!(matches!(err, Error::MissingRecipient));
    assert!(mailer.transport().messages().is_empty());
}

#[tokio::test]
async fn test_send_flat_body() {
    let mailer = mailer(MemoryTransport::default());
    let body = FlatBody::new(
        vec![
            HeaderField::new("Subject", ["flat"]),
            HeaderField::new("Content-Type", ["multipart/mixed", "boundary=flat"]),
        ],
        vec![
            Block::new(vec![HeaderField::new("Content-Type", ["text/plain"])], "one"),
            Block::new(vec![HeaderField::new("Content-Type", ["text/plain"])], "two"),
        ],
    );

    mailer.send_body(&body, &["a@example.com"]).await.unwrap();

    let messages = mailer.transport().messages();
    assert_eq!(messages[0].as_bytes(), body.encode());
    assert_eq!(messages[0].matches("\r\n--flat\r\n").count(), 2);
}
