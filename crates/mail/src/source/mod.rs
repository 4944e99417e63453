//! Message sources
//!
//! [`MessageSource`] is the handle the intake pipeline reads mail through.
//! [`GmailClient`](crate::GmailClient) talks to the Gmail API;
//! [`InMemorySource`] serves fixture messages without network access.
//! Neither changes mailbox state.

mod memory;

pub use memory::InMemorySource;

use crate::gmail::api::GmailMessage;
use crate::models::MessageId;

/// Why a message could not be read from the provider
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The provider does not know this identifier
    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    /// Transport, authentication or API failure
    #[error("Gmail API error: {0:#}")]
    Provider(anyhow::Error),
}

/// Read-only access to one mailbox
pub trait MessageSource {
    /// Identifier of the most recent inbox message, `None` for an empty inbox
    fn fetch_latest(&self) -> Result<Option<MessageId>, FetchError>;

    /// Full raw message for an identifier
    fn fetch_by_id(&self, id: &MessageId) -> Result<GmailMessage, FetchError>;
}
