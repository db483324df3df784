//! One-shot delivery over a fresh connection.

use crate::client::{Client, MailTransaction};
use crate::config::{Config, Security};
use crate::error::{Error, Result};
use crate::stream::connect;

/// Delivers `message` to `to` from `from` using the server in `config`.
///
/// Opens a connection, greets the server, upgrades to TLS when configured,
/// authenticates when credentials are present, runs the mail transaction and
/// says QUIT.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] when `to` is empty or an address cannot
/// be used in a command, and any connection, TLS or server error raised on
/// the way.
pub async fn send_mail(config: &Config, from: &str, to: &[String], message: &[u8]) -> Result<()> {
    let Some((first, rest)) = to.split_first() else {
        return Err(Error::InvalidAddress("No recipients specified".into()));
    };

    let stream = connect(config).await?;
    let client = Client::from_stream(stream, config.io_timeout)
        .await?
        .ehlo(&config.client_hostname)
        .await?;

    let client = if config.security == Security::StartTls {
        client
            .starttls(&config.host, &config.client_hostname)
            .await?
    } else {
        client
    };

    let size = Some(message.len());
    let client: Client<MailTransaction> = match &config.credentials {
        Some(creds) => {
            let client = client.auth_plain(&creds.username, &creds.password).await?;
            tracing::debug!(username = %creds.username, "Authenticated");
            client.mail_from(from, size).await?
        }
        None => client.mail_from(from, size).await?,
    };

    let mut client = client.rcpt_to(first).await?;
    for recipient in rest {
        client = client.rcpt_to(recipient).await?;
    }

    let client = client.data().await?.send_message(message).await?;
    tracing::info!(recipients = to.len(), bytes = message.len(), "Message accepted");

    client.quit().await
}
