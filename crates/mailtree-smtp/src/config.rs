//! Connection configuration types.

use std::fmt;
use std::time::Duration;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Security {
    /// No encryption (port 25). **Not recommended for production.**
    None,
    /// Start with plaintext, upgrade with STARTTLS (port 587).
    #[default]
    StartTls,
    /// TLS from the start (port 465).
    Implicit,
}

impl Security {
    /// Returns the default port for this security mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None => 25,
            Self::StartTls => 587,
            Self::Implicit => 465,
        }
    }
}

/// Username and password for AUTH PLAIN.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SMTP connection configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Credentials; when absent no AUTH command is sent.
    pub credentials: Option<Credentials>,
    /// Name announced in EHLO.
    pub client_hostname: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Timeout for each server reply.
    pub io_timeout: Duration,
}

impl Config {
    /// Creates a new configuration using STARTTLS on port 587.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        ConfigBuilder::new(host).build()
    }

    /// Creates a configuration builder.
    #[must_use]
    pub fn builder(host: impl Into<String>) -> ConfigBuilder {
        ConfigBuilder::new(host)
    }
}

/// Builder for connection configuration.
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    host: String,
    port: Option<u16>,
    security: Security,
    credentials: Option<Credentials>,
    client_hostname: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

impl ConfigBuilder {
    /// Creates a new builder with the given hostname.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: None,
            security: Security::default(),
            credentials: None,
            client_hostname: "localhost".to_string(),
            connect_timeout: Duration::from_secs(30),
            io_timeout: Duration::from_secs(60),
        }
    }

    /// Sets the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Sets the security mode.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self
    }

    /// Sets the AUTH PLAIN credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials::new(username, password));
        self
    }

    /// Sets the name announced in EHLO.
    #[must_use]
    pub fn client_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.client_hostname = hostname.into();
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the per-reply timeout.
    #[must_use]
    pub const fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> Config {
        Config {
            host: self.host,
            port: self.port.unwrap_or_else(|| self.security.default_port()),
            security: self.security,
            credentials: self.credentials,
            client_hostname: self.client_hostname,
            connect_timeout: self.connect_timeout,
            io_timeout: self.io_timeout,
        }
    }
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

    #[test]
    fn test_default_ports() {
        assert_eq!(Security::None.default_port(), 25);
        assert_eq!(Security::StartTls.default_port(), 587);
        assert_eq!(Security::Implicit.default_port(), 465);
    }

    #[test]
    fn test_config_new() {
        let config = Config::new("smtp.example.com");
        assert_eq!(config.host, "smtp.example.com");
        assert_eq!(config.port, 587);
        assert_eq!(config.security, Security::StartTls);
        assert!(config.credentials.is_none());
        assert_eq!(config.client_hostname, "localhost");
    }

    #[test]
    fn test_config_builder() {
        let config = Config::builder("smtp.example.com")
            .security(Security::Implicit)
            .credentials("user", "secret")
            .client_hostname("client.example.com")
            .connect_timeout(Duration::from_secs(5))
            .build();

        assert_eq!(config.port, 465);
        assert_eq!(config.client_hostname, "client.example.com");
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.credentials.unwrap().username, "user");
    }

    #[test]
    fn test_explicit_port_wins() {
        let config = Config::builder("localhost")
            .security(Security::None)
            .port(2525)
            .build();
        assert_eq!(config.port, 2525);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials::new("user", "hunter2");
        let debug = format!("{creds:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }
}
