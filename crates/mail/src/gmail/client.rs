//! Gmail API HTTP client
//!
//! Provides read-only methods for listing and fetching messages.
//! Uses synchronous HTTP (ureq). No request timeout is configured, so a
//! stalled connection blocks the caller.

use anyhow::{Context, Result};
use log::debug;

use super::api::{GmailMessage, ListMessagesResponse};
use super::GmailAuth;
use crate::models::MessageId;
use crate::source::{FetchError, MessageSource};

/// Gmail API client for fetching messages
pub struct GmailClient {
    auth: GmailAuth,
}

impl GmailClient {
    /// Gmail API base URL
    const BASE_URL: &'static str = "https://gmail.googleapis.com/gmail/v1";

    /// Label of the inbox
    pub const INBOX_LABEL: &'static str = "INBOX";

    /// Create a new Gmail client
    pub fn new(auth: GmailAuth) -> Self {
        Self { auth }
    }

    /// List message IDs from the user's mailbox, newest first
    ///
    /// # Arguments
    /// * `max_results` - Maximum number of messages to return (1-500)
    /// * `label_ids` - Only return messages carrying all of these labels
    pub fn list_messages(
        &self,
        max_results: usize,
        label_ids: &[&str],
    ) -> Result<ListMessagesResponse> {
        let access_token = self.auth.access_token()?;
        let url = list_url(Self::BASE_URL, max_results, label_ids);

        let mut response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .context("Failed to send list messages request")?;

        let list: ListMessagesResponse = response
            .body_mut()
            .read_json()
            .context("Failed to parse list messages response")?;

        Ok(list)
    }

    /// Get full message details by ID
    ///
    /// # Arguments
    /// * `id` - The message ID to fetch
    ///
    /// # Errors
    /// Returns `FetchError::MessageNotFound` when Gmail answers 404, or 400
    /// for an identifier it cannot parse.
    pub fn get_message(&self, id: &MessageId) -> Result<GmailMessage, FetchError> {
        let access_token = self.auth.access_token().map_err(FetchError::Provider)?;
        let url = message_url(Self::BASE_URL, id);

        let response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call();

        match response {
            Ok(mut resp) => resp
                .body_mut()
                .read_json()
                .context("Failed to parse message response")
                .map_err(FetchError::Provider),
            Err(e) => Err(classify_get_error(e, id)),
        }
    }
}

impl MessageSource for GmailClient {
    fn fetch_latest(&self) -> Result<Option<MessageId>, FetchError> {
        let list = self
            .list_messages(1, &[Self::INBOX_LABEL])
            .map_err(FetchError::Provider)?;

        let latest = list
            .messages
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(|msg_ref| MessageId::new(msg_ref.id));
        debug!("Latest inbox message: {:?}", latest);
        Ok(latest)
    }

    fn fetch_by_id(&self, id: &MessageId) -> Result<GmailMessage, FetchError> {
        self.get_message(id)
    }
}

/// Map a failed `messages.get` call to a fetch error
///
/// 404 is an unknown id, 400 an id Gmail cannot parse; both mean there is
/// no such message. Anything else is a provider failure.
fn classify_get_error(err: ureq::Error, id: &MessageId) -> FetchError {
    match err {
        ureq::Error::StatusCode(400 | 404) => FetchError::MessageNotFound(id.clone()),
        e => FetchError::Provider(anyhow::anyhow!("Failed to fetch message {}: {}", id, e)),
    }
}

fn list_url(base: &str, max_results: usize, label_ids: &[&str]) -> String {
    let mut url = format!(
        "{}/users/me/messages?maxResults={}",
        base,
        max_results.clamp(1, 500)
    );
    for label in label_ids {
        url.push_str(&format!("&labelIds={}", urlencoding::encode(label)));
    }
    url
}

fn message_url(base: &str, id: &MessageId) -> String {
    format!(
        "{}/users/me/messages/{}?format=full",
        base,
        urlencoding::encode(id.as_str())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_or_malformed_id_is_not_found() {
        let id = MessageId::new("18c2f0a1b2c3d4e5");
        for status in [400, 404] {
            let err = classify_get_error(ureq::Error::StatusCode(status), &id);
            assert!(
                matches!(&err, FetchError::MessageNotFound(found) if found == &id),
                "status {} gave {:?}",
                status,
                err
            );
        }
    }

    #[test]
    fn test_other_statuses_are_provider_errors() {
        let id = MessageId::new("m1");
        for status in [401, 403, 429, 500, 503] {
            let err = classify_get_error(ureq::Error::StatusCode(status), &id);
            assert!(
                matches!(err, FetchError::Provider(_)),
                "status {} gave {:?}",
                status,
                err
            );
        }
    }

    #[test]
    fn test_transport_failure_is_provider_error() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "connection reset by peer");
        let err = classify_get_error(ureq::Error::Io(io), &MessageId::new("m1"));

        assert!(matches!(err, FetchError::Provider(_)));
        let message = err.to_string();
        assert!(message.contains("m1"));
        assert!(message.contains("connection reset by peer"));
    }

    #[test]
    fn test_latest_inbox_url() {
        assert_eq!(
            list_url("https://api", 1, &[GmailClient::INBOX_LABEL]),
            "https://api/users/me/messages?maxResults=1&labelIds=INBOX"
        );
    }

    #[test]
    fn test_list_url_clamps_page_size() {
        assert_eq!(
            list_url("https://api", 10_000, &[]),
            "https://api/users/me/messages?maxResults=500"
        );
    }

    #[test]
    fn test_message_url_escapes_id() {
        assert_eq!(
            message_url("https://api", &MessageId::new("18c/../x")),
            "https://api/users/me/messages/18c%2F..%2Fx?format=full"
        );
    }
}
