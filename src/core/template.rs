use crate::utils::error::{MailerError, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const NAME_TOKEN: &str = "{{NAME}}";
pub const TRACK_TOKEN: &str = "{{TRACK}}";
pub const ROLE_TOKEN: &str = "{{ROLE}}";

/// Values substituted into the template for one recipient.
#[derive(Debug, Clone, Copy)]
pub struct TemplateValues<'a> {
    pub name: &'a str,
    pub track: &'a str,
    pub role: &'a str,
}

/// Message body template with literal `{{TOKEN}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(source) => {
                tracing::debug!("Loaded template {} ({} bytes)", path.display(), source.len());
                Ok(Self::new(source))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MailerError::TemplateNotFound {
                path: path.display().to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Replaces every occurrence of each token, one pass per token in the
    /// order NAME, TRACK, ROLE. A value inserted by an earlier pass is seen by
    /// the later ones.
    pub fn render(&self, values: &TemplateValues<'_>) -> String {
        self.source
            .replace(NAME_TOKEN, values.name)
            .replace(TRACK_TOKEN, values.track)
            .replace(ROLE_TOKEN, values.role)
    }
}
