//! Envelope normalization.
//!
//! Raw queue messages arrive either as a bare job payload or wrapped in one
//! layer of SNS notification envelope (a `Type: "Notification"` marker with
//! the real payload JSON-encoded inside the `Message` field). Normalization
//! unwraps the envelope when present, then validates the payload before any
//! side effect occurs.

use serde_json::Value;
use thiserror::Error;

use vox_models::JobRecord;

/// Fields that must be present and non-empty in every job payload.
const REQUIRED_FIELDS: [&str; 4] = ["text", "parentId", "ttsTaskId", "srtTaskId"];

/// Validation failures during message normalization.
///
/// `Malformed` (unparseable body or unparseable nested envelope payload) is
/// deliberately distinct from `MissingFields`: a parse failure carries the
/// raw structure for diagnostics and must never be silently swallowed.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("Malformed message: {reason}")]
    Malformed {
        reason: String,
        /// The original raw structure, verbatim
        raw: String,
    },

    #[error("Missing required fields: {}", missing.join(", "))]
    MissingFields {
        /// Exactly the required fields that are absent or empty
        missing: Vec<&'static str>,
        /// All keys actually present in the payload, for diagnostics
        present: Vec<String>,
    },
}

/// Extract and validate the canonical job record from a raw message body.
pub fn normalize(body: &str) -> Result<JobRecord, EnvelopeError> {
    let outer: Value = serde_json::from_str(body).map_err(|e| EnvelopeError::Malformed {
        reason: format!("body is not valid JSON: {}", e),
        raw: body.to_string(),
    })?;

    let payload = unwrap_envelope(&outer, body)?;
    validate_required(&payload)?;

    serde_json::from_value(payload).map_err(|e| EnvelopeError::Malformed {
        reason: format!("payload does not deserialize: {}", e),
        raw: body.to_string(),
    })
}

/// Unwrap one layer of SNS notification envelope when present.
fn unwrap_envelope(outer: &Value, raw: &str) -> Result<Value, EnvelopeError> {
    let is_notification = outer
        .get("Type")
        .and_then(Value::as_str)
        .map(|t| t == "Notification")
        .unwrap_or(false);

    if is_notification {
        let message = outer.get("Message").and_then(Value::as_str);
        match message {
            Some(inner) => serde_json::from_str(inner).map_err(|e| EnvelopeError::Malformed {
                reason: format!("envelope Message is not valid JSON: {}", e),
                raw: raw.to_string(),
            }),
            // Notification marker without a Message string is malformed
            None => Err(EnvelopeError::Malformed {
                reason: "notification envelope has no Message field".to_string(),
                raw: raw.to_string(),
            }),
        }
    } else {
        Ok(outer.clone())
    }
}

/// Check that every required field is present and non-empty.
fn validate_required(payload: &Value) -> Result<(), EnvelopeError> {
    let object = payload.as_object().ok_or_else(|| EnvelopeError::Malformed {
        reason: "payload is not a JSON object".to_string(),
        raw: payload.to_string(),
    })?;

    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .filter(|field| {
            !matches!(object.get(**field), Some(Value::String(s)) if !s.is_empty())
        })
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(EnvelopeError::MissingFields {
            missing,
            present: object.keys().cloned().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> String {
        serde_json::json!({
            "text": "Hello world.",
            "parentId": "story-1",
            "ttsTaskId": "task-a",
            "srtTaskId": "task-s",
            "speed": 1.5
        })
        .to_string()
    }

    #[test]
    fn plain_payload_normalizes() {
        let record = normalize(&payload()).expect("normalize plain payload");
        assert_eq!(record.parent_id, "story-1");
        assert_eq!(record.speed, 1.5);
        assert!(record.use_alignment);
    }

    #[test]
    fn envelope_yields_same_record_as_inner_payload() {
        let enveloped = serde_json::json!({
            "Type": "Notification",
            "MessageId": "mid-1",
            "Message": payload()
        })
        .to_string();

        let from_envelope = normalize(&enveloped).expect("normalize enveloped");
        let from_inner = normalize(&payload()).expect("normalize inner");
        assert_eq!(from_envelope.parent_id, from_inner.parent_id);
        assert_eq!(from_envelope.tts_task_id, from_inner.tts_task_id);
        assert_eq!(from_envelope.srt_task_id, from_inner.srt_task_id);
        assert_eq!(from_envelope.text, from_inner.text);
    }

    #[test]
    fn unparseable_body_is_malformed() {
        let err = normalize("not json").unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed { .. }));
    }

    #[test]
    fn unparseable_envelope_message_is_malformed_not_missing() {
        let enveloped = serde_json::json!({
            "Type": "Notification",
            "Message": "{truncated"
        })
        .to_string();
        let err = normalize(&enveloped).unwrap_err();
        match err {
            EnvelopeError::Malformed { raw, .. } => assert_eq!(raw, enveloped),
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn missing_fields_reported_exactly() {
        let body = serde_json::json!({
            "text": "Hello",
            "srtTaskId": "task-s",
            "voice": "af_heart"
        })
        .to_string();
        let err = normalize(&body).unwrap_err();
        match err {
            EnvelopeError::MissingFields { missing, present } => {
                assert_eq!(missing, vec!["parentId", "ttsTaskId"]);
                assert!(present.contains(&"text".to_string()));
                assert!(present.contains(&"voice".to_string()));
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn empty_string_counts_as_missing() {
        let body = serde_json::json!({
            "text": "",
            "parentId": "p",
            "ttsTaskId": "t",
            "srtTaskId": "s"
        })
        .to_string();
        let err = normalize(&body).unwrap_err();
        match err {
            EnvelopeError::MissingFields { missing, .. } => assert_eq!(missing, vec!["text"]),
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn all_fields_missing() {
        let err = normalize("{}").unwrap_err();
        match err {
            EnvelopeError::MissingFields { missing, present } => {
                assert_eq!(missing, REQUIRED_FIELDS.to_vec());
                assert!(present.is_empty());
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }
}
