//! Gmail API integration
//!
//! This module provides:
//! - OAuth2 token handling (read-only scope)
//! - Gmail API client for listing and fetching messages
//! - Response normalization to the pipeline record

mod auth;
mod client;
mod normalize;

pub use auth::{CredentialsMissing, GmailAuth};
pub use client::GmailClient;
pub use normalize::{normalize, normalize_message};

/// Gmail API response types
pub mod api {
    use serde::{Deserialize, Serialize};

    /// Response from listing messages
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ListMessagesResponse {
        pub messages: Option<Vec<MessageRef>>,
        pub next_page_token: Option<String>,
        pub result_size_estimate: Option<u32>,
    }

    /// Reference to a message (just ID and thread ID)
    #[derive(Debug, Clone, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageRef {
        pub id: String,
        pub thread_id: Option<String>,
    }

    /// Full message from Gmail API (`format=full`)
    ///
    /// Every field is optional so that normalization never fails on a
    /// message the provider returned in an unexpected shape.
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct GmailMessage {
        pub id: Option<String>,
        pub thread_id: Option<String>,
        pub label_ids: Option<Vec<String>>,
        pub snippet: Option<String>,
        pub internal_date: Option<String>,
        pub payload: Option<MessagePart>,
    }

    /// Email header (name-value pair)
    #[derive(Debug, Clone, Deserialize, Serialize)]
    pub struct Header {
        pub name: String,
        pub value: String,
    }

    /// Part body (data is URL-safe base64)
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessageBody {
        pub attachment_id: Option<String>,
        pub size: Option<u32>,
        pub data: Option<String>,
    }

    /// Message part; the top-level payload has the same shape
    #[derive(Debug, Clone, Default, Deserialize, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MessagePart {
        pub part_id: Option<String>,
        pub mime_type: Option<String>,
        pub filename: Option<String>,
        pub headers: Option<Vec<Header>>,
        pub body: Option<MessageBody>,
        pub parts: Option<Vec<MessagePart>>,
    }
}
