//! In-memory message source
//!
//! Used for tests and for running the pipeline against fixture messages.

use std::cell::Cell;
use std::collections::HashMap;

use super::{FetchError, MessageSource};
use crate::gmail::api::GmailMessage;
use crate::models::MessageId;

/// Fixture mailbox holding raw Gmail messages
#[derive(Default)]
pub struct InMemorySource {
    messages: HashMap<MessageId, GmailMessage>,
    /// Inbox ids, oldest first
    inbox: Vec<MessageId>,
    /// When set, every call fails with a provider error
    outage: Option<String>,
    requests: Cell<usize>,
}

impl InMemorySource {
    /// Create a new empty mailbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mailbox whose every request fails
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            outage: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Add a message to the inbox as its newest entry
    pub fn deliver(&mut self, message: GmailMessage) -> MessageId {
        let id = self.store(message);
        self.inbox.retain(|existing| existing != &id);
        self.inbox.push(id.clone());
        id
    }

    /// Add a message that is reachable by id but not in the inbox
    pub fn store(&mut self, message: GmailMessage) -> MessageId {
        let id = MessageId::new(message.id.clone().unwrap_or_default());
        self.messages.insert(id.clone(), message);
        id
    }

    /// Number of requests served (or refused) so far
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    fn begin_request(&self) -> Result<(), FetchError> {
        self.requests.set(self.requests.get() + 1);
        match &self.outage {
            Some(reason) => Err(FetchError::Provider(anyhow::anyhow!("{}", reason))),
            None => Ok(()),
        }
    }
}

impl MessageSource for InMemorySource {
    fn fetch_latest(&self) -> Result<Option<MessageId>, FetchError> {
        self.begin_request()?;
        Ok(self.inbox.last().cloned())
    }

    fn fetch_by_id(&self, id: &MessageId) -> Result<GmailMessage, FetchError> {
        self.begin_request()?;
        self.messages
            .get(id)
            .cloned()
            .ok_or_else(|| FetchError::MessageNotFound(id.clone()))
    }
}
