pub mod dispatch;
pub mod recipients;
pub mod template;

pub use crate::domain::model::{OutgoingMessage, RecipientRecord, RunSummary, SendOutcome};
pub use crate::domain::ports::Relay;
pub use crate::utils::error::Result;
