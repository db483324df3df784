//! Sends a text + HTML message with an optional attachment.
//!
//! ```text
//! SMTP_HOST=smtp.example.com SMTP_USER=me@example.com SMTP_PASSWORD=secret \
//!     cargo run -p mailtree --example send -- friend@example.com [file]
//! ```

use std::env;

use anyhow::Context;
use mailtree::smtp::{Config, Security};
use mailtree::{Mailer, SmtpTransport};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailtree=debug,mailtree_smtp=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = env::var("SMTP_HOST").context("SMTP_HOST is not set")?;
    let user = env::var("SMTP_USER").context("SMTP_USER is not set")?;
    let password = env::var("SMTP_PASSWORD").context("SMTP_PASSWORD is not set")?;
    let security = match env::var("SMTP_SECURITY").as_deref() {
        Ok("none") => Security::None,
        Ok("implicit") => Security::Implicit,
        _ => Security::StartTls,
    };

    let mut args = env::args().skip(1);
    let recipient = args.next().context("usage: send <recipient> [file]")?;

    let config = Config::builder(host)
        .security(security)
        .credentials(user.as_str(), password)
        .build();

    let mut mailer = Mailer::new(user, SmtpTransport::new(config));
    mailer.subject("Hello from mailtree");
    mailer.text("This message has a plain text part.");
    mailer.html("<p>This message has an <b>HTML</b> part.</p>");

    if let Some(path) = args.next() {
        let data = tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {path}"))?;
        let filename = std::path::Path::new(&path)
            .file_name()
            .map_or_else(|| path.clone(), |name| name.to_string_lossy().into_owned());
        mailer.attach(filename, data);
    }

    mailer.send_email(&[recipient]).await?;
    tracing::info!("Done");
    Ok(())
}
