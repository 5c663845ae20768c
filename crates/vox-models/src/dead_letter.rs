//! Dead-letter entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A record written to the dead-letter queue once per unrecoverable failure.
///
/// Carries enough context to replay the message manually: the original body
/// verbatim, the error, a stable error kind for filtering, and the delivery
/// attempt count reported by the queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetterEntry {
    /// The raw message body as received from the queue
    pub original_message: String,
    /// Human-readable error description
    pub error_message: String,
    /// Stable error classification (e.g. "synthesis", "upload")
    pub error_kind: String,
    /// When the failure was recorded
    pub timestamp: DateTime<Utc>,
    /// How many times the queue had delivered the message
    pub attempt_count: u32,
}

impl DeadLetterEntry {
    /// Create an entry timestamped now.
    pub fn new(
        original_message: impl Into<String>,
        error_message: impl Into<String>,
        error_kind: impl Into<String>,
        attempt_count: u32,
    ) -> Self {
        Self {
            original_message: original_message.into(),
            error_message: error_message.into(),
            error_kind: error_kind.into(),
            timestamp: Utc::now(),
            attempt_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dead_letter_serde_roundtrip() {
        let entry = DeadLetterEntry::new("{\"text\":\"hi\"}", "no audio produced", "synthesis", 3);
        let json = serde_json::to_string(&entry).expect("serialize DeadLetterEntry");
        let decoded: DeadLetterEntry = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(decoded.original_message, entry.original_message);
        assert_eq!(decoded.error_kind, "synthesis");
        assert_eq!(decoded.attempt_count, 3);
    }
}
