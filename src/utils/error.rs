use thiserror::Error;

#[derive(Error, Debug)]
pub enum MailerError {
    #[error("{name} is not set in the environment or .env file")]
    MissingCredentialError { name: &'static str },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Template file not found at {path}")]
    TemplateNotFound { path: String },

    #[error("CSV file not found at {path}")]
    CsvNotFound { path: String },

    #[error("The following columns were not found in the CSV: {}", missing.join(", "))]
    MissingColumnsError {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Error connecting to SMTP server {host}: {reason}")]
    RelayConnectError { host: String, reason: String },

    #[error("Invalid email address '{address}': {reason}")]
    InvalidAddressError { address: String, reason: String },

    #[error("Failed to build message: {0}")]
    MessageBuildError(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    SmtpError(#[from] lettre::transport::smtp::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl MailerError {
    /// Extra line printed after the diagnostic, if there is anything useful to add.
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            MailerError::MissingCredentialError { .. } => Some(
                "Set CLUB_EMAIL and CLUB_EMAIL_PASSWORD in the environment or in a .env file"
                    .to_string(),
            ),
            MailerError::MissingColumnsError { available, .. } => {
                Some(format!("Available columns: {}", available.join(", ")))
            }
            MailerError::InvalidConfigValueError { field, .. } if field == "SMTP_PORT" => {
                Some("SMTP_PORT must be a number between 1 and 65535".to_string())
            }
            MailerError::RelayConnectError { .. } => Some(
                "Check SMTP_SERVER/SMTP_PORT and that the password is valid for this relay"
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Process exit status for an error that aborts the run.
    pub fn exit_code(&self) -> i32 {
        match self {
            MailerError::RelayConnectError { .. } | MailerError::SmtpError(_) => 2,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, MailerError>;
