//! Integration tests for the SMTP session.
//!
//! A scripted server on a loopback socket plays the remote side so the whole
//! session runs without a real mail server.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_test::{assert_err, assert_ok};

use mailtree_smtp::{Config, Error, Security, send_mail};

/// What the scripted server saw.
#[derive(Debug, Default)]
struct Transcript {
    commands: Vec<String>,
    data: Vec<u8>,
}

/// Starts a server that accepts one connection and answers like a small
/// submission server. Recipients containing `reject` are refused.
async fn scripted_server() -> (u16, JoinHandle<Transcript>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (read, mut write) = socket.into_split();
        let mut reader = BufReader::new(read);
        let mut transcript = Transcript::default();

        write.write_all(b"220 test.local ESMTP\r\n").await.unwrap();

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await.unwrap() == 0 {
                break;
            }
            let line = line.trim_end().to_string();
            transcript.commands.push(line.clone());

            let reply: &[u8] = if line.starts_with("EHLO") {
                b"250-test.local\r\n250-SIZE 10240000\r\n250 AUTH PLAIN LOGIN\r\n"
            } else if line.starts_with("AUTH PLAIN") {
                b"235 2.7.0 Authentication successful\r\n"
            } else if line.starts_with("MAIL FROM") {
                b"250 2.1.0 OK\r\n"
            } else if line.starts_with("RCPT TO") && line.contains("reject") {
                b"550 5.1.1 No such user\r\n"
            } else if line.starts_with("RCPT TO") {
                b"250 2.1.5 OK\r\n"
            } else if line == "DATA" {
                write.write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n").await.unwrap();
                loop {
                    let mut data_line = Vec::new();
                    reader.read_until(b'\n', &mut data_line).await.unwrap();
                    if data_line == b".\r\n" {
                        break;
                    }
                    transcript.data.extend_from_slice(&data_line);
                }
                b"250 2.0.0 Queued\r\n"
            } else if line == "QUIT" {
                write.write_all(b"221 2.0.0 Bye\r\n").await.unwrap();
                break;
            } else {
                b"502 5.5.2 Command not recognized\r\n"
            };
            write.write_all(reply).await.unwrap();
        }

        transcript
    });

    (port, handle)
}

fn plain_config(port: u16) -> Config {
    Config::builder("127.0.0.1")
        .security(Security::None)
        .port(port)
        .client_hostname("client.test")
        .io_timeout(Duration::from_secs(5))
        .build()
}

#[tokio::test]
async fn test_send_mail_full_session() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let (port, server) = scripted_server().await;
    let config = Config {
        credentials: Some(mailtree_smtp::Credentials::new("user", "pass")),
        ..plain_config(port)
    };

    let message = b"Subject: hi\r\n\r\n.leading dot\r\nbody\r\n--b--\r\n";
    let to = vec!["a@example.com".to_string(), "b@example.com".to_string()];
    assert_ok!(send_mail(&config, "me@example.com", &to, message).await);

    let transcript = server.await.unwrap();
    assert_eq!(
        transcript.commands,
        [
            "EHLO client.test",
            "AUTH PLAIN AHVzZXIAcGFzcw==",
            &format!("MAIL FROM:<me@example.com> SIZE={}", message.len()),
            "RCPT TO:<a@example.com>",
            "RCPT TO:<b@example.com>",
            "DATA",
            "QUIT",
        ]
    );
    assert_eq!(
        transcript.data,
        b"Subject: hi\r\n\r\n..leading dot\r\nbody\r\n--b--\r\n"
    );
}

#[tokio::test]
async fn test_send_mail_without_credentials_skips_auth() {
    let (port, server) = scripted_server().await;
    let to = vec!["a@example.com".to_string()];
    assert_ok!(send_mail(&plain_config(port), "me@example.com", &to, b"x").await);

    let transcript = server.await.unwrap();
    assert!(!transcript.commands.iter().any(|c| c.starts_with("AUTH")));
    assert_eq!(transcript.data, b"x\r\n");
}

#[tokio::test]
async fn test_rejected_recipient_is_permanent_error() {
    let (port, server) = scripted_server().await;
    let to = vec!["reject@example.com".to_string()];
    let err = assert_err!(send_mail(&plain_config(port), "me@example.com", &to, b"x").await);

    assert!(err.is_permanent());
    assert!(matches!(err, Error::Smtp { code: 550, .. }));
    drop(server);
}

#[tokio::test]
async fn test_starttls_required_but_not_offered() {
    let (port, server) = scripted_server().await;
    let config = Config {
        security: Security::StartTls,
        ..plain_config(port)
    };
    let to = vec!["a@example.com".to_string()];
    let err = assert_err!(send_mail(&config, "me@example.com", &to, b"x").await);

    assert!(matches!(err, Error::NotSupported("STARTTLS")));
    drop(server);
}

#[tokio::test]
async fn test_no_recipients() {
    let config = plain_config(1);
    let err = assert_err!(send_mail(&config, "me@example.com", &[], b"x").await);
    assert!(matches!(err, Error::InvalidAddress(_)));
}

#[tokio::test]
async fn test_silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut sink = Vec::new();
        let _ = socket.read_to_end(&mut sink).await;
    });

    let config = Config {
        io_timeout: Duration::from_millis(100),
        ..plain_config(port)
    };
    let to = vec!["a@example.com".to_string()];
    let err = assert_err!(send_mail(&config, "me@example.com", &to, b"x").await);

    assert!(matches!(err, Error::Timeout(_)));
    server.abort();
}
