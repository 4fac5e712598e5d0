pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliArgs;

pub use crate::adapters::smtp::SmtpSession;
pub use crate::config::{relay::RelayConfig, ColumnMapping, RunConfig};
pub use crate::core::{dispatch::MailMerge, recipients::RecipientSource, template::Template};
pub use crate::utils::error::{MailerError, Result};
