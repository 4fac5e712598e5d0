use crate::config::relay::RelayConfig;
use crate::domain::model::OutgoingMessage;
use crate::domain::ports::Relay;
use crate::utils::error::{MailerError, Result};
use async_trait::async_trait;
use lettre::address::AddressError;
use lettre::message::{Mailbox, SinglePart};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::{Address, Message};

const AUTH_MECHANISMS: &[Mechanism] = &[Mechanism::Plain, Mechanism::Login];

/// How the connection is secured before credentials are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChannelSecurity {
    StartTls,
    /// Loopback relays in tests only.
    #[cfg_attr(not(test), allow(dead_code))]
    Plaintext,
}

/// Authenticated SMTP session over a STARTTLS-upgraded connection.
///
/// lettre drops the connection on any SMTP error during a transaction, so a
/// rejected recipient leaves it broken. The next send then opens and
/// authenticates a fresh connection before continuing.
pub struct SmtpSession {
    connection: AsyncSmtpConnection,
    config: RelayConfig,
    security: ChannelSecurity,
}

impl SmtpSession {
    /// Connects, upgrades with STARTTLS and authenticates as the sender.
    /// Credentials are only sent once the channel is encrypted.
    pub async fn connect(config: &RelayConfig) -> Result<Self> {
        Self::connect_with(config, ChannelSecurity::StartTls).await
    }

    pub(crate) async fn connect_with(
        config: &RelayConfig,
        security: ChannelSecurity,
    ) -> Result<Self> {
        let connection = establish(config, security).await?;

        tracing::info!("✅ Authenticated with {} as {}", config.host, config.sender_address);
        println!(
            "Successfully connected to {} as {}",
            config.host, config.sender_address
        );

        Ok(Self {
            connection,
            config: config.clone(),
            security,
        })
    }

    async fn reconnect_if_broken(&mut self) -> Result<()> {
        if self.connection.has_broken() {
            tracing::info!("🔄 Reconnecting to {} after a failed send", self.config.host);
            self.connection = establish(&self.config, self.security).await?;
        }
        Ok(())
    }
}

async fn establish(config: &RelayConfig, security: ChannelSecurity) -> Result<AsyncSmtpConnection> {
    let connect_error = |reason: String| MailerError::RelayConnectError {
        host: config.host.clone(),
        reason,
    };
    let hello_name = ClientId::default();

    tracing::debug!("Connecting to {}:{}", config.host, config.port);
    let mut connection = AsyncSmtpConnection::connect_tokio1(
        (config.host.as_str(), config.port),
        None,
        &hello_name,
        None,
        None,
    )
    .await
    .map_err(|e| connect_error(e.to_string()))?;

    if security == ChannelSecurity::StartTls {
        if !connection.can_starttls() {
            return Err(connect_error(
                "server does not support STARTTLS".to_string(),
            ));
        }

        let tls = TlsParameters::new(config.host.clone())
            .map_err(|e| connect_error(e.to_string()))?;
        connection
            .starttls(tls, &hello_name)
            .await
            .map_err(|e| connect_error(e.to_string()))?;
        tracing::debug!("🔒 Connection to {} upgraded to TLS", config.host);
    }

    let credentials = Credentials::new(
        config.sender_address.clone(),
        config.credential_secret.clone(),
    );
    connection
        .auth(AUTH_MECHANISMS, &credentials)
        .await
        .map_err(|e| connect_error(e.to_string()))?;

    Ok(connection)
}

#[async_trait]
impl Relay for SmtpSession {
    async fn send(&mut self, message: &OutgoingMessage) -> Result<()> {
        let email = build_message(message)?;
        self.reconnect_if_broken().await?;

        let response = self
            .connection
            .send(email.envelope(), &email.formatted())
            .await?;

        tracing::debug!("Relay accepted message for {}: {}", message.to, response.code());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.connection.has_broken() {
            return Ok(());
        }
        self.connection.quit().await?;
        tracing::debug!("Closed SMTP session with {}", self.config.host);
        Ok(())
    }
}

fn invalid_address(address: &str) -> impl FnOnce(AddressError) -> MailerError + '_ {
    move |e| MailerError::InvalidAddressError {
        address: address.to_string(),
        reason: e.to_string(),
    }
}

/// Builds the MIME message: display-name sender, one recipient, HTML body.
pub fn build_message(message: &OutgoingMessage) -> Result<Message> {
    let from_address: Address = message
        .from_address
        .parse()
        .map_err(invalid_address(&message.from_address))?;
    let to: Mailbox = message.to.parse().map_err(invalid_address(&message.to))?;

    let email = Message::builder()
        .from(Mailbox::new(Some(message.from_name.clone()), from_address))
        .to(to)
        .subject(message.subject.clone())
        .singlepart(SinglePart::html(message.html_body.clone()))?;

    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
    use tokio::net::{TcpListener, TcpStream};

    #[derive(Clone, Copy)]
    struct FakeRelay {
        offers_starttls: bool,
        accepts_auth: bool,
    }

    type EventLog = Arc<Mutex<Vec<String>>>;

    /// Minimal SMTP responder on 127.0.0.1. Rejects any RCPT containing `bad@`.
    async fn spawn_fake_relay(relay: FakeRelay) -> (u16, EventLog) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let events: EventLog = Arc::new(Mutex::new(Vec::new()));

        let log = events.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve_session(stream, relay, log.clone()));
            }
        });

        (port, events)
    }

    async fn serve_session(stream: TcpStream, relay: FakeRelay, log: EventLog) {
        let (read, mut write) = stream.into_split();
        let mut lines = BufReader::new(read).lines();
        let mut recipient = String::new();

        log.lock().unwrap().push("CONNECT".to_string());
        if write.write_all(b"220 fake.relay ESMTP\r\n").await.is_err() {
            return;
        }

        while let Ok(Some(line)) = lines.next_line().await {
            let command = line.to_ascii_uppercase();
            let reply = if command.starts_with("EHLO") {
                let mut reply = "250-fake.relay\r\n".to_string();
                if relay.offers_starttls {
                    reply.push_str("250-STARTTLS\r\n");
                }
                reply.push_str("250 AUTH PLAIN LOGIN\r\n");
                reply
            } else if command.starts_with("AUTH") {
                log.lock().unwrap().push("AUTH".to_string());
                if relay.accepts_auth {
                    "235 2.7.0 Authentication successful\r\n".to_string()
                } else {
                    "535 5.7.8 Authentication credentials invalid\r\n".to_string()
                }
            } else if command.starts_with("RCPT TO") {
                recipient = line
                    .split('<')
                    .nth(1)
                    .and_then(|rest| rest.split('>').next())
                    .unwrap_or_default()
                    .to_string();
                if recipient.contains("bad@") {
                    "550 5.1.1 no such user\r\n".to_string()
                } else {
                    "250 2.1.5 OK\r\n".to_string()
                }
            } else if command == "DATA" {
                if write.write_all(b"354 go ahead\r\n").await.is_err() {
                    return;
                }
                while let Ok(Some(body_line)) = lines.next_line().await {
                    if body_line == "." {
                        break;
                    }
                }
                log.lock().unwrap().push(format!("DELIVERED {}", recipient));
                "250 2.0.0 queued\r\n".to_string()
            } else if command == "QUIT" {
                log.lock().unwrap().push("QUIT".to_string());
                let _ = write.write_all(b"221 2.0.0 bye\r\n").await;
                return;
            } else {
                "250 OK\r\n".to_string()
            };

            if write.write_all(reply.as_bytes()).await.is_err() {
                return;
            }
        }
    }

    fn relay_config(port: u16) -> RelayConfig {
        RelayConfig {
            host: "127.0.0.1".to_string(),
            port,
            sender_address: "club@example.com".to_string(),
            credential_secret: "app-password".to_string(),
        }
    }

    fn events(log: &EventLog) -> Vec<String> {
        log.lock().unwrap().clone()
    }

    fn outgoing(to: &str) -> OutgoingMessage {
        OutgoingMessage {
            from_name: "Tuwaiq Club".to_string(),
            from_address: "club@example.com".to_string(),
            to: to.to_string(),
            subject: "Welcome".to_string(),
            html_body: "<p>Hello Ana</p>".to_string(),
        }
    }

    #[test]
    fn test_build_message_headers_and_envelope() {
        let email = build_message(&outgoing("ana@x.com")).unwrap();

        let envelope = email.envelope();
        assert_eq!(envelope.from().map(|a| a.to_string()).as_deref(), Some("club@example.com"));
        assert_eq!(envelope.to()[0].to_string(), "ana@x.com");

        let raw = String::from_utf8(email.formatted()).unwrap();
        assert!(raw.contains("Tuwaiq Club"));
        assert!(raw.contains("<club@example.com>"));
        assert!(raw.contains("ana@x.com"));
        assert!(raw.contains("Subject: Welcome"));
        assert!(raw.contains("Content-Type: text/html; charset=utf-8"));
        assert!(raw.contains("<p>Hello Ana</p>"));
    }

    #[test]
    fn test_invalid_recipient_address() {
        let err = build_message(&outgoing("not-an-address")).unwrap_err();
        match err {
            MailerError::InvalidAddressError { address, .. } => {
                assert_eq!(address, "not-an-address")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_sender_address() {
        let mut message = outgoing("ana@x.com");
        message.from_address = "club".to_string();
        assert!(matches!(
            build_message(&message),
            Err(MailerError::InvalidAddressError { .. })
        ));
    }

    #[tokio::test]
    async fn test_connect_requires_starttls() {
        let (port, log) = spawn_fake_relay(FakeRelay {
            offers_starttls: false,
            accepts_auth: true,
        })
        .await;

        let err = SmtpSession::connect(&relay_config(port)).await.err().unwrap();

        assert!(matches!(err, MailerError::RelayConnectError { .. }));
        assert_eq!(err.exit_code(), 2);
        // Credentials never went out over the plain channel.
        assert!(!events(&log).contains(&"AUTH".to_string()));
    }

    #[tokio::test]
    async fn test_rejected_credentials_fail_the_connect() {
        let (port, log) = spawn_fake_relay(FakeRelay {
            offers_starttls: false,
            accepts_auth: false,
        })
        .await;

        let err = SmtpSession::connect_with(&relay_config(port), ChannelSecurity::Plaintext)
            .await
            .err()
            .unwrap();

        assert!(matches!(err, MailerError::RelayConnectError { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(!events(&log).iter().any(|e| e.starts_with("DELIVERED")));
    }

    #[tokio::test]
    async fn test_rejected_recipient_does_not_end_the_session() {
        let (port, log) = spawn_fake_relay(FakeRelay {
            offers_starttls: false,
            accepts_auth: true,
        })
        .await;
        let mut session = SmtpSession::connect_with(&relay_config(port), ChannelSecurity::Plaintext)
            .await
            .unwrap();

        let rejected = session.send(&outgoing("bad@x.com")).await;
        assert!(matches!(rejected, Err(MailerError::SmtpError(_))));

        session.send(&outgoing("ok@x.com")).await.unwrap();
        session.close().await.unwrap();

        let events = events(&log);
        assert!(events.contains(&"DELIVERED ok@x.com".to_string()));
        assert!(!events.contains(&"DELIVERED bad@x.com".to_string()));
    }

    #[tokio::test]
    async fn test_close_sends_quit() {
        let (port, log) = spawn_fake_relay(FakeRelay {
            offers_starttls: false,
            accepts_auth: true,
        })
        .await;
        let mut session = SmtpSession::connect_with(&relay_config(port), ChannelSecurity::Plaintext)
            .await
            .unwrap();

        session.send(&outgoing("ana@x.com")).await.unwrap();
        session.close().await.unwrap();

        assert_eq!(
            events(&log),
            vec!["CONNECT", "AUTH", "DELIVERED ana@x.com", "QUIT"]
        );
    }

    #[tokio::test]
    async fn test_merge_continues_after_rejected_recipient() {
        use crate::config::{ColumnMapping, RunConfig};
        use crate::core::dispatch::{MailMerge, RunStatus};
        use crate::core::template::Template;
        use crate::domain::model::RecipientRecord;

        let (port, log) = spawn_fake_relay(FakeRelay {
            offers_starttls: false,
            accepts_auth: true,
        })
        .await;
        let session = SmtpSession::connect_with(&relay_config(port), ChannelSecurity::Plaintext)
            .await
            .unwrap();

        let config = RunConfig {
            source_path: "members.csv".to_string(),
            template_path: "welcome.html".to_string(),
            role: "Member".to_string(),
            subject: "Welcome".to_string(),
            sender_display_name: "Tuwaiq Club".to_string(),
            columns: ColumnMapping::default(),
        };
        let merge = MailMerge::new(Template::new("Hi {{NAME}}"), &config, "club@example.com");
        let rows = ["bad@x.com", "cy@x.com"].map(|email| {
            Ok::<_, MailerError>(RecipientRecord::new(vec![
                ("Name".to_string(), "Member".to_string()),
                ("Track".to_string(), "AI".to_string()),
                ("Email".to_string(), email.to_string()),
            ]))
        });

        let summary = match merge.run(session, rows).await {
            RunStatus::Completed(summary) => summary,
            RunStatus::Aborted { error, .. } => panic!("run aborted: {error}"),
        };

        assert_eq!(summary.sent, 1);
        assert_eq!(summary.failed, 1);
        let events = events(&log);
        assert!(events.contains(&"DELIVERED cy@x.com".to_string()));
        assert_eq!(events.last().map(String::as_str), Some("QUIT"));
    }
}
