use crate::domain::model::OutgoingMessage;
use crate::utils::error::Result;
use async_trait::async_trait;

/// An open, authenticated session with a mail relay.
#[async_trait]
pub trait Relay: Send {
    /// Transmits one message. An error here only affects this recipient.
    async fn send(&mut self, message: &OutgoingMessage) -> Result<()>;

    /// Ends the session. Called once, after the last send.
    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<'a, R: Relay + ?Sized> Relay for &'a mut R {
    async fn send(&mut self, message: &OutgoingMessage) -> Result<()> {
        (**self).send(message).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}
