//! Gmail API response normalization
//!
//! Converts Gmail API messages to the flat record consumed by the pipeline.
//! Normalization is total: missing headers, bodies or payloads yield empty
//! fields, never errors.

use base64::prelude::*;
use chrono::{DateTime, Utc};
use log::{debug, warn};

use super::api::{GmailMessage, MessagePart};
use crate::models::{MessageId, NormalizedRecord};

const PLAIN_TEXT: &str = "text/plain";

/// Normalize a Gmail API message, stamping the current time
pub fn normalize(gmail_msg: GmailMessage) -> NormalizedRecord {
    normalize_message(gmail_msg, Utc::now())
}

/// Normalize a Gmail API message with an explicit extraction time
pub fn normalize_message(gmail_msg: GmailMessage, extracted_at: DateTime<Utc>) -> NormalizedRecord {
    let id = match gmail_msg.id.filter(|id| !id.is_empty()) {
        Some(id) => MessageId::new(id),
        None => {
            let id = MessageId::placeholder(extracted_at);
            warn!("Gmail returned a message without an id, using {}", id);
            id
        }
    };

    let payload = gmail_msg.payload.unwrap_or_default();

    let body = extract_plain_text_body(&payload)
        .map(|text| text.trim().to_string())
        .unwrap_or_default();

    let mut attachments = Vec::new();
    if let Some(parts) = &payload.parts {
        collect_attachment_names(parts, &mut attachments);
    }

    NormalizedRecord {
        id,
        extraction_timestamp: extracted_at,
        sender: extract_header(&payload, "From"),
        subject: extract_header(&payload, "Subject"),
        message_date: extract_header(&payload, "Date"),
        body,
        snippet: gmail_msg.snippet.unwrap_or_default(),
        labels: gmail_msg.label_ids.unwrap_or_default(),
        attachments,
    }
}

/// Extract a header value by name; a repeated header yields its last value
fn extract_header(payload: &MessagePart, name: &str) -> Option<String> {
    payload.headers.as_ref()?.iter().rev().find_map(|h| {
        if h.name.eq_ignore_ascii_case(name) {
            Some(h.value.clone())
        } else {
            None
        }
    })
}

/// Extract the plain text body from a message payload
///
/// A multipart payload is searched for its first decodable `text/plain`
/// part. A single-part payload is decoded directly unless it declares some
/// other MIME type.
fn extract_plain_text_body(payload: &MessagePart) -> Option<String> {
    if let Some(parts) = &payload.parts {
        return find_plain_text_in_parts(parts);
    }

    if payload
        .mime_type
        .as_deref()
        .is_some_and(|m| m != PLAIN_TEXT)
    {
        return None;
    }

    part_data(payload).and_then(decode_base64_body)
}

/// Depth-first search of message parts for decodable text/plain content
fn find_plain_text_in_parts(parts: &[MessagePart]) -> Option<String> {
    for part in parts {
        if part.mime_type.as_deref() == Some(PLAIN_TEXT) {
            match part_data(part).and_then(decode_base64_body) {
                Some(text) => return Some(text),
                None => debug!("Skipping undecodable text/plain part {:?}", part.part_id),
            }
        }

        if let Some(nested) = &part.parts
            && let Some(text) = find_plain_text_in_parts(nested)
        {
            return Some(text);
        }
    }

    None
}

/// Collect declared attachment filenames, depth-first
fn collect_attachment_names(parts: &[MessagePart], names: &mut Vec<String>) {
    for part in parts {
        if let Some(filename) = part.filename.as_deref()
            && !filename.is_empty()
        {
            names.push(filename.to_string());
        }

        if let Some(nested) = &part.parts {
            collect_attachment_names(nested, names);
        }
    }
}

fn part_data(part: &MessagePart) -> Option<&str> {
    part.body.as_ref()?.data.as_deref()
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
/// Byte sequences that are not valid UTF-8 are dropped.
fn decode_base64_body(data: &str) -> Option<String> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let compact: String = data.split_ascii_whitespace().collect();
    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(&compact).ok())
        .map(|bytes| utf8_dropping_invalid(&bytes))
}

fn utf8_dropping_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}
