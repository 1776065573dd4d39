// src/models.rs

//! Core data structures shared across storage, notification and jobs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with advisory expiry metadata.
///
/// Expiry is evaluated lazily at read time; an expired entry is reported as
/// absent even though the underlying object may still exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredValue {
    /// Opaque textual payload
    pub content: String,
    /// MIME-type hint for external consumers
    pub content_type: String,
    /// Advisory expiry instant; `None` means the entry never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    /// Whether the entry should be treated as absent at the given instant.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expiry) => expiry < now,
            None => false,
        }
    }
}

/// A single named value inside a history row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Numeric view of the field, if it holds a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// One time-series record, immutable once written.
///
/// Row keys are ISO date strings, unique within a partition; the latest row
/// is the one with the maximum row key in string order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRow {
    pub partition: String,
    pub row_key: String,
    pub fields: HashMap<String, FieldValue>,
}

impl HistoryRow {
    /// Look up a numeric field by name.
    pub fn number(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(FieldValue::as_number)
    }
}

/// Confirmation of a delivered notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Message identifier assigned by the chat backend
    pub message_id: i64,
}

/// Text formatting mode for outbound notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFormat {
    /// Plain text, no markup interpreted
    Plain,
    /// Rich text (HTML markup)
    #[default]
    Html,
}

/// Delivery options for a single notification.
#[derive(Debug, Clone, Default)]
pub struct MessageOptions {
    pub format: MessageFormat,
    /// Suppress the link preview card under the message
    pub disable_link_preview: bool,
    /// Deliver without a client-side notification sound
    pub silent: bool,
}

/// Ephemeral result of the top-up offer extraction.
///
/// Consumed within a single job run; a subset of its fields ends up in the
/// notification message and the last-posted marker.
#[derive(Debug, Clone)]
pub struct OfferNotice {
    /// Link to the campaign terms PDF
    pub pdf_url: String,
    /// Human-readable validity window extracted from the PDF
    pub interval: String,
    /// When the extraction happened
    pub extracted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_stored_value_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        let expired = StoredValue {
            content: "34.90".into(),
            content_type: "text/plain".into(),
            expires_at: Some(now - chrono::Duration::hours(1)),
        };
        let live = StoredValue {
            content: "34.90".into(),
            content_type: "text/plain".into(),
            expires_at: Some(now + chrono::Duration::hours(1)),
        };
        let eternal = StoredValue {
            content: "34.90".into(),
            content_type: "text/plain".into(),
            expires_at: None,
        };

        assert!(expired.is_expired(now));
        assert!(!live.is_expired(now));
        assert!(!eternal.is_expired(now));
    }

    #[test]
    fn test_field_value_serde_untagged() {
        let n: FieldValue = serde_json::from_str("34.9").unwrap();
        assert_eq!(n, FieldValue::Number(34.9));

        let t: FieldValue = serde_json::from_str("\"12:00-14:00\"").unwrap();
        assert_eq!(t, FieldValue::Text("12:00-14:00".into()));

        assert_eq!(serde_json::to_string(&FieldValue::Number(35.1)).unwrap(), "35.1");
    }

    #[test]
    fn test_history_row_number_lookup() {
        let mut fields = HashMap::new();
        fields.insert("Price".to_string(), FieldValue::Number(34.9));
        fields.insert("Source".to_string(), FieldValue::Text("portal".into()));

        let row = HistoryRow {
            partition: "price".into(),
            row_key: "2024-06-01".into(),
            fields,
        };

        assert_eq!(row.number("Price"), Some(34.9));
        assert_eq!(row.number("Source"), None);
        assert_eq!(row.number("Missing"), None);
    }
}
