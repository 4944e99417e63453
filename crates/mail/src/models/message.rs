//! Message identifier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a message (Gmail message ID)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    /// Prefix of ids synthesized for messages the provider returned without one
    pub const PLACEHOLDER_PREFIX: &'static str = "sin_id_";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build a timestamp-derived id (`sin_id_<secs>.<micros>`)
    ///
    /// Only used when the upstream message carries no id at all.
    pub fn placeholder(at: DateTime<Utc>) -> Self {
        Self(format!(
            "{}{}.{:06}",
            Self::PLACEHOLDER_PREFIX,
            at.timestamp(),
            at.timestamp_subsec_micros()
        ))
    }

    /// Whether this id was synthesized by [`MessageId::placeholder`]
    pub fn is_placeholder(&self) -> bool {
        self.0.starts_with(Self::PLACEHOLDER_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for MessageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MessageId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_placeholder_format() {
        let at = Utc.timestamp_opt(1_700_000_000, 42_000).unwrap();
        let id = MessageId::placeholder(at);
        assert_eq!(id.as_str(), "sin_id_1700000000.000042");
        assert!(id.is_placeholder());
    }

    #[test]
    fn test_provider_id_is_not_placeholder() {
        assert!(!MessageId::new("18c2f0a1b2c3d4e5").is_placeholder());
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&MessageId::new("abc")).unwrap();
        assert_eq!(json, r#""abc""#);
    }
}
