//! The sending client.

use mailtree_mime::{Attachment, ContentType, DefaultHeaders, FlatBody, MessageComposer, encode};

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::transport::{Envelope, Transport};

/// Collects message content and sends it through a [`Transport`].
///
/// Content set on the mailer is kept between sends, so the same message can
/// be delivered to several recipient lists.
///
/// ```no_run
/// use mailtree::{Mailer, SmtpTransport};
/// use mailtree_smtp::Config;
///
/// # async fn run() -> mailtree::Result<()> {
/// let config = Config::builder("smtp.example.com")
///     .credentials("me@example.com", "password")
///     .build();
///
/// let mut mailer = Mailer::new("me@example.com", SmtpTransport::new(config));
/// mailer.subject("Report");
/// mailer.text("See attached.");
/// mailer.attach("report.csv", b"a,b\n1,2\n".to_vec());
/// mailer.send_email(&["boss@example.com"]).await?;
/// # Ok(())
/// # }
/// ```
pub struct Mailer<T> {
    from: String,
    transport: T,
    defaults: DefaultHeaders,
    clock: Box<dyn Clock>,
    subject: Option<String>,
    text: Option<String>,
    html: Option<String>,
    attachments: Vec<Attachment>,
}

impl<T: Transport> Mailer<T> {
    /// Creates a mailer sending as `from` through `transport`.
    #[must_use]
    pub fn new(from: impl Into<String>, transport: T) -> Self {
        Self {
            from: from.into(),
            transport,
            defaults: DefaultHeaders::default(),
            clock: Box::new(SystemClock),
            subject: None,
            text: None,
            html: None,
            attachments: Vec::new(),
        }
    }

    /// Replaces the default header table.
    #[must_use]
    pub fn with_defaults(mut self, defaults: DefaultHeaders) -> Self {
        self.defaults = defaults;
        self
    }

    /// Replaces the source of the `Date` header.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// The transport messages are handed to.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sets the subject.
    pub fn subject(&mut self, subject: impl Into<String>) {
        self.subject = Some(subject.into());
    }

    /// Sets the plain-text body.
    pub fn text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Sets the HTML body.
    pub fn html(&mut self, html: impl Into<String>) {
        self.html = Some(html.into());
    }

    /// Attaches a file as `application/octet-stream`. Attaching a second
    /// file with the same name replaces the first.
    pub fn attach(&mut self, filename: impl Into<String>, data: impl Into<Vec<u8>>) {
        self.push_attachment(Attachment::new(filename, data));
    }

    /// Attaches a file with an explicit media type.
    pub fn attach_typed(
        &mut self,
        filename: impl Into<String>,
        content_type: ContentType,
        data: impl Into<Vec<u8>>,
    ) {
        self.push_attachment(Attachment::new(filename, data).with_content_type(content_type));
    }

    /// Composes the message from the collected content and sends it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRecipient`] or [`Error::EmptyContent`] before
    /// the transport is touched, and [`Error::Transport`] if delivery fails.
    pub async fn send_email<S: AsRef<str>>(&self, recipients: &[S]) -> Result<()> {
        let envelope = self.envelope(recipients)?;

        let mut composer = MessageComposer::new(&self.defaults)
            .from(self.from.as_str())
            .to(envelope.to().iter().map(String::as_str))
            .date(self.clock.now());
        if let Some(subject) = &self.subject {
            composer = composer.subject(subject.as_str());
        }
        if let Some(text) = &self.text {
            composer = composer.text(text.as_str());
        }
        if let Some(html) = &self.html {
            composer = composer.html(html.as_str());
        }
        for attachment in &self.attachments {
            composer = composer.attach(attachment.clone());
        }

        let message = encode(&composer.build()?);
        self.deliver(&envelope, &message).await
    }

    /// Sends a prebuilt single-level body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingRecipient`] when no recipient is given,
    /// [`Error::EmptyContent`] when the body has no blocks, and
    /// [`Error::Transport`] if delivery fails.
    pub async fn send_body<S: AsRef<str>>(&self, body: &FlatBody, recipients: &[S]) -> Result<()> {
        let envelope = self.envelope(recipients)?;
        if body.blocks().is_empty() {
            return Err(Error::EmptyContent);
        }
        self.deliver(&envelope, &body.encode()).await
    }

    fn push_attachment(&mut self, attachment: Attachment) {
        match self
            .attachments
            .iter_mut()
            .find(|a| a.filename() == attachment.filename())
        {
            Some(existing) => *existing = attachment,
            None => self.attachments.push(attachment),
        }
    }

    fn envelope<S: AsRef<str>>(&self, recipients: &[S]) -> Result<Envelope> {
        Envelope::new(self.from.as_str(), recipients).ok_or(Error::MissingRecipient)
    }

    async fn deliver(&self, envelope: &Envelope, message: &[u8]) -> Result<()> {
        tracing::debug!(
            from = %envelope.from(),
            recipients = envelope.to().len(),
            bytes = message.len(),
            "Sending message"
        );
        self.transport
            .send_raw(envelope, message)
            .await
            .map_err(Error::Transport)?;
        tracing::info!(recipients = envelope.to().len(), "Message sent");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::transport::BoxError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(Envelope, Vec<u8>)>>,
    }

    impl Transport for Recorder {
        async fn send_raw(
            &self,
            envelope: &Envelope,
            message: &[u8],
        ) -> std::result::Result<(), BoxError> {
            self.sent
                .lock()
                .unwrap()
                .push((envelope.clone(), message.to_vec()));
            Ok(())
        }
    }

    fn mailer() -> Mailer<Recorder> {
        Mailer::new("me@example.com", Recorder::default())
            .with_clock(FixedClock::new("Mon, 1 Jan 2024 00:00:00 +0000"))
    }

    fn sent(mailer: &Mailer<Recorder>) -> Vec<(Envelope, Vec<u8>)> {
        mailer.transport().sent.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_send_text_only() {
        let mut mailer = mailer();
        mailer.subject("Hello");
        mailer.text("hi");
        mailer.send_email(&["a@example.com"]).await.unwrap();

        let sent = sent(&mailer);
        assert_eq!(sent.len(), 1);
        let (envelope, message) = &sent[0];
        assert_eq!(envelope.to(), ["a@example.com"]);

        let message = String::from_utf8(message.clone()).unwrap();
        assert!(message.starts_with(
            "From: me@example.com\r\nTo: a@example.com\r\nDate: Mon, 1 Jan 2024 00:00:00 +0000\r\nSubject: Hello\r\n"
        ));
        assert!(message.contains("Content-Type: text/plain"));
        assert!(!message.contains("boundary="));
    }

    #[tokio::test]
    async fn test_missing_recipient_skips_transport() {
        let mut mailer = mailer();
        mailer.text("hi");
        let err = mailer.send_email::<&str>(&[]).await.unwrap_err();
        assert!(matches!(err, Error::MissingRecipient));
        assert!(sent(&mailer).is_empty());
    }

    #[tokio::test]
    async fn test_empty_content_skips_transport() {
        let mut mailer = mailer();
        mailer.subject("nothing");
        let err = mailer.send_email(&["a@example.com"]).await.unwrap_err();
        assert!(matches!(err, Error::EmptyContent));
        assert!(sent(&mailer).is_empty());
    }

    #[test]
    fn test_attach_same_name_replaces() {
        let mut mailer = mailer();
        mailer.attach("a.txt", b"first".to_vec());
        mailer.attach("a.txt", b"second".to_vec());
        assert_eq!(mailer.attachments.len(), 1);
        assert_eq!(mailer.attachments[0].data(), b"second");
    }

    #[tokio::test]
    async fn test_send_body_requires_blocks() {
        let mailer = mailer();
        let err = mailer
            .send_body(&FlatBody::default(), &["a@example.com"])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::EmptyContent));
    }
}
