use crate::utils::error::{MailerError, Result};
use crate::utils::validation::validate_port;
use std::fmt;

pub const SENDER_ADDRESS_VAR: &str = "CLUB_EMAIL";
pub const CREDENTIAL_SECRET_VAR: &str = "CLUB_EMAIL_PASSWORD";
pub const HOST_VAR: &str = "SMTP_SERVER";
pub const PORT_VAR: &str = "SMTP_PORT";

pub const DEFAULT_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_PORT: u16 = 587;

/// Relay connection settings. Resolved once at startup, read-only afterwards.
#[derive(Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub sender_address: String,
    pub credential_secret: String,
}

impl RelayConfig {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or(MailerError::MissingCredentialError { name })
        };

        let sender_address = required(SENDER_ADDRESS_VAR)?;
        let credential_secret = required(CREDENTIAL_SECRET_VAR)?;

        let host = lookup(HOST_VAR).unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match lookup(PORT_VAR) {
            Some(raw) => validate_port(PORT_VAR, &raw)?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            host,
            port,
            sender_address,
            credential_secret,
        })
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("sender_address", &self.sender_address)
            .field("credential_secret", &"<redacted>")
            .finish()
    }
}
