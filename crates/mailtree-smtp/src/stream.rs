//! Low-level SMTP stream handling.

use crate::config::{Config, Security};
use crate::error::{Error, Result};
use rustls::pki_types::ServerName;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_rustls::{
    TlsConnector,
    rustls::{ClientConfig, RootCertStore},
};

/// SMTP stream (TCP or TLS).
#[derive(Debug)]
pub enum SmtpStream {
    /// Plain TCP connection.
    Tcp(BufReader<TcpStream>),
    /// TLS-encrypted connection.
    Tls(Box<BufReader<tokio_rustls::client::TlsStream<TcpStream>>>),
}

impl SmtpStream {
    /// Reads a line from the stream, without its terminator.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the server closed the
    /// connection.
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = String::new();
        let read = match self {
            Self::Tcp(reader) => reader.read_line(&mut line).await?,
            Self::Tls(reader) => reader.read_line(&mut line).await?,
        };
        if read == 0 {
            return Err(Error::Protocol("Connection closed by server".into()));
        }
        Ok(line.trim_end().to_string())
    }

    /// Writes data to the stream and flushes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Tcp(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
            Self::Tls(reader) => {
                reader.get_mut().write_all(data).await?;
                reader.get_mut().flush().await?;
            }
        }
        Ok(())
    }

    /// Returns true once the stream is encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }

    /// Upgrades a TCP stream to TLS.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS handshake fails.
    pub async fn upgrade_to_tls(self, hostname: &str) -> Result<Self> {
        let tcp_stream = match self {
            Self::Tcp(reader) => reader.into_inner(),
            Self::Tls(_) => return Err(Error::Protocol("Already using TLS".into())),
        };

        let tls_stream = handshake(hostname, tcp_stream).await?;
        Ok(Self::Tls(Box::new(BufReader::new(tls_stream))))
    }
}

/// Opens the connection described by `config`: plain TCP for
/// [`Security::None`] and [`Security::StartTls`], TLS from the first byte for
/// [`Security::Implicit`].
///
/// # Errors
///
/// Returns an error if the connection or TLS handshake fails, or
/// [`Error::Timeout`] if it does not complete within `connect_timeout`.
pub async fn connect(config: &Config) -> Result<SmtpStream> {
    with_timeout(config.connect_timeout, "connecting", async {
        let addr = format!("{}:{}", config.host, config.port);
        let tcp_stream = TcpStream::connect(&addr).await?;
        tracing::debug!(%addr, security = ?config.security, "Connected to SMTP server");

        match config.security {
            Security::None | Security::StartTls => Ok(SmtpStream::Tcp(BufReader::new(tcp_stream))),
            Security::Implicit => {
                let tls_stream = handshake(&config.host, tcp_stream).await?;
                Ok(SmtpStream::Tls(Box::new(BufReader::new(tls_stream))))
            }
        }
    })
    .await
}

/// Runs `fut`, failing with [`Error::Timeout`] once `limit` elapses.
pub(crate) async fn with_timeout<T>(
    limit: Duration,
    action: &'static str,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| Error::Timeout(action))?
}

async fn handshake(
    hostname: &str,
    tcp_stream: TcpStream,
) -> Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let connector = create_tls_connector();
    let server_name = ServerName::try_from(hostname.to_string())
        .map_err(|_| Error::Protocol(format!("Invalid hostname: {hostname}")))?;

    Ok(connector.connect(server_name, tcp_stream).await?)
}

/// Creates a TLS connector trusting the bundled web PKI roots.
fn create_tls_connector() -> TlsConnector {
    let root_store = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}
