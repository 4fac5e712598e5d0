use crate::config::ColumnMapping;
use std::fmt;

/// One data row of the recipient CSV, keyed by header name in header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipientRecord {
    fields: Vec<(String, String)>,
}

impl RecipientRecord {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// Value of `column`, or `""` when the row has no such column. With a
    /// repeated header the right-most column wins.
    pub fn get(&self, column: &str) -> &str {
        self.fields
            .iter()
            .rev()
            .find(|(key, _)| key == column)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Extracts the fields the merge needs, trimmed.
    pub fn recipient(&self, columns: &ColumnMapping) -> Recipient {
        Recipient {
            name: self.get(&columns.name).trim().to_string(),
            track: self.get(&columns.track).trim().to_string(),
            email: self.get(&columns.email).trim().to_string(),
        }
    }
}

impl fmt::Display for RecipientRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{:?}: {:?}", key, value)?;
        }
        f.write_str("}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub name: String,
    pub track: String,
    pub email: String,
}

/// A fully addressed message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub from_name: String,
    pub from_address: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingMessage {
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_address)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    SkippedMissingEmail,
    Failed(String),
}

/// Per-run totals. Only `sent` is reported to the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub sent: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &SendOutcome) {
        match outcome {
            SendOutcome::Sent => self.sent += 1,
            SendOutcome::SkippedMissingEmail => self.skipped += 1,
            SendOutcome::Failed(_) => self.failed += 1,
        }
    }
}
