use crate::config::{ColumnMapping, RunConfig};
use crate::core::template::{Template, TemplateValues};
use crate::domain::model::{OutgoingMessage, Recipient, RecipientRecord, RunSummary, SendOutcome};
use crate::domain::ports::Relay;
use crate::utils::error::{MailerError, Result};

/// How the send phase ended. Either way the relay has been closed.
#[derive(Debug)]
pub enum RunStatus {
    Completed(RunSummary),
    /// Reading a row failed part way through; remaining rows were not sent.
    Aborted { error: MailerError },
}

/// Renders the template for each recipient row and hands it to the relay.
pub struct MailMerge {
    template: Template,
    role: String,
    subject: String,
    sender_display_name: String,
    sender_address: String,
    columns: ColumnMapping,
}

impl MailMerge {
    pub fn new(template: Template, config: &RunConfig, sender_address: impl Into<String>) -> Self {
        Self {
            template,
            role: config.role.clone(),
            subject: config.subject.clone(),
            sender_display_name: config.sender_display_name.clone(),
            sender_address: sender_address.into(),
            columns: config.columns.clone(),
        }
    }

    pub fn compose(&self, recipient: &Recipient) -> OutgoingMessage {
        let html_body = self.template.render(&TemplateValues {
            name: &recipient.name,
            track: &recipient.track,
            role: &self.role,
        });

        OutgoingMessage {
            from_name: self.sender_display_name.clone(),
            from_address: self.sender_address.clone(),
            to: recipient.email.clone(),
            subject: self.subject.clone(),
            html_body,
        }
    }

    /// Handles a single row. Never fails: problems become the outcome.
    pub async fn deliver<R: Relay + ?Sized>(
        &self,
        relay: &mut R,
        record: &RecipientRecord,
    ) -> SendOutcome {
        let recipient = record.recipient(&self.columns);
        if recipient.email.is_empty() {
            println!("Skipping row with missing email: {}", record);
            return SendOutcome::SkippedMissingEmail;
        }

        let message = self.compose(&recipient);
        match relay.send(&message).await {
            Ok(()) => {
                println!("Sent email to: {} ({})", recipient.name, recipient.email);
                SendOutcome::Sent
            }
            Err(e) => {
                tracing::warn!("❌ Send to {} failed: {:?}", recipient.email, e);
                println!("Failed to send to {}: {}", recipient.email, e);
                SendOutcome::Failed(e.to_string())
            }
        }
    }

    /// Sends to every row in order. Returns early only when reading a row
    /// fails; the relay is left open for the caller to close.
    pub async fn dispatch<R, I>(&self, relay: &mut R, records: I) -> Result<RunSummary>
    where
        R: Relay + ?Sized,
        I: IntoIterator<Item = Result<RecipientRecord>>,
    {
        let mut summary = RunSummary::default();

        for record in records {
            let record = record?;
            let outcome = self.deliver(&mut *relay, &record).await;
            summary.record(&outcome);
        }

        tracing::info!(
            "📊 sent={}, skipped={}, failed={}",
            summary.sent,
            summary.skipped,
            summary.failed
        );
        println!("\nFinished! Sent {} emails.", summary.sent);
        Ok(summary)
    }

    /// Runs the send phase and then closes the relay exactly once, whether
    /// the send phase finished or stopped on an error. An error while reading
    /// rows is reported here and does not propagate.
    pub async fn run<R, I>(&self, mut relay: R, records: I) -> RunStatus
    where
        R: Relay,
        I: IntoIterator<Item = Result<RecipientRecord>>,
    {
        let result = self.dispatch(&mut relay, records).await;

        if let Err(e) = relay.close().await {
            tracing::warn!("⚠️ Relay session did not close cleanly: {}", e);
        }

        match result {
            Ok(summary) => RunStatus::Completed(summary),
            Err(error) => {
                tracing::error!("❌ Run stopped while reading rows: {:?}", error);
                println!("An unexpected error occurred: {}", error);
                RunStatus::Aborted { error }
            }
        }
    }
}
