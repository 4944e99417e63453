//! Normalized record written for the downstream pipeline
//!
//! JSON keys follow the contract read by the `process_email` stage, which
//! predates this tool, so several of them are Spanish.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::MessageId;

/// Flat, provider-independent representation of one email
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Gmail message ID
    pub id: MessageId,
    /// When this record was produced
    #[serde(
        rename = "fecha_extraccion",
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub extraction_timestamp: DateTime<Utc>,
    /// Raw `From` header
    #[serde(rename = "remitente", default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    /// Raw `Subject` header
    #[serde(rename = "asunto", default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Raw `Date` header, left unparsed
    #[serde(rename = "fecha_correo", default, skip_serializing_if = "Option::is_none")]
    pub message_date: Option<String>,
    /// Plain text body, trimmed
    pub body: String,
    /// Provider preview text
    pub snippet: String,
    /// Gmail label IDs (e.g., "INBOX", "UNREAD")
    pub labels: Vec<String>,
    /// Attachment filenames
    #[serde(rename = "adjuntos")]
    pub attachments: Vec<String>,
}

/// `2024-01-01T09:30:00.123456+00:00`, or `2024-01-01T09:30:00+00:00` on a
/// whole second
fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_timestamp(ts))
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    let precision = if ts.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    ts.to_rfc3339_opts(precision, false)
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = String::deserialize(deserializer)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> NormalizedRecord {
        NormalizedRecord {
            id: MessageId::new("m1"),
            extraction_timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap(),
            sender: Some("a@x.com".to_string()),
            subject: None,
            message_date: None,
            body: "Hello".to_string(),
            snippet: String::new(),
            labels: vec!["INBOX".to_string()],
            attachments: vec![],
        }
    }

    #[test]
    fn test_contract_keys() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["fecha_extraccion"], "2024-01-01T09:30:00+00:00");
        assert_eq!(obj["remitente"], "a@x.com");
        assert!(obj.contains_key("adjuntos"));
        assert!(!obj.contains_key("asunto"));
        assert!(!obj.contains_key("fecha_correo"));
    }

    #[test]
    fn test_timestamp_keeps_microseconds() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
            + chrono::Duration::microseconds(4_250);
        assert_eq!(format_timestamp(&ts), "2024-01-01T09:30:00.004250+00:00");

        // sub-microsecond precision is truncated, not rounded up
        let ts = ts + chrono::Duration::nanoseconds(999);
        assert_eq!(format_timestamp(&ts), "2024-01-01T09:30:00.004250+00:00");
    }

    #[test]
    fn test_timestamp_nanos_below_one_micro_omit_fraction() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap()
            + chrono::Duration::nanoseconds(500);
        assert_eq!(format_timestamp(&ts), "2024-01-01T09:30:00+00:00");
    }

    #[test]
    fn test_reads_back_written_form() {
        let json = serde_json::to_string(&sample()).unwrap();
        let parsed: NormalizedRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sample());
    }
}
