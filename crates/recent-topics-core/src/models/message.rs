use serde::{Deserialize, Serialize};

use crate::constants::STREAM_MESSAGE_TYPE;

/// Errors raised while projecting a raw message into a [`ReducedEvent`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedEventError {
    #[error("Malformed message: missing required field `{0}`")]
    MissingField(&'static str),

    #[error("Malformed message: invalid JSON: {0}")]
    InvalidJson(String),
}

/// Whether a message was posted to a stream topic or somewhere else (e.g. a DM).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Stream,
    Other,
}

impl MessageKind {
    pub fn from_type(message_type: &str) -> Self {
        if message_type == STREAM_MESSAGE_TYPE {
            MessageKind::Stream
        } else {
            MessageKind::Other
        }
    }
}

/// A message record as delivered by the message system.
///
/// Every field is optional on the wire; [`reduce`] decides which ones are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// Unix seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_id: Option<u64>,

    /// Stream display name
    #[serde(default, rename = "stream", skip_serializing_if = "Option::is_none")]
    pub stream_name: Option<String>,

    /// Older servers send the topic as `subject`
    #[serde(default, alias = "subject", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unread: Option<bool>,

    /// "stream" or "private"
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
}

impl RawMessage {
    /// Parse a raw message from a JSON string
    pub fn from_json(json: &str) -> Result<Self, MalformedEventError> {
        serde_json::from_str(json).map_err(|e| MalformedEventError::InvalidJson(e.to_string()))
    }

    /// Parse a raw message from a pre-parsed serde_json::Value (avoids double parsing)
    pub fn from_value(value: &serde_json::Value) -> Result<Self, MalformedEventError> {
        Self::deserialize(value).map_err(|e| MalformedEventError::InvalidJson(e.to_string()))
    }

    pub fn is_stream(&self) -> bool {
        self.message_type.as_deref() == Some(STREAM_MESSAGE_TYPE)
    }
}

/// The minimal projection of a message that the topic index keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReducedEvent {
    pub id: u64,
    /// Second granularity; not unique across messages
    pub timestamp: u64,
    pub stream_id: u64,
    pub topic: String,
    pub sender_id: u64,
    pub unread: bool,
    pub kind: MessageKind,
    /// Display-only, never part of identity or ordering
    pub stream_name: Option<String>,
}

impl ReducedEvent {
    pub fn is_stream(&self) -> bool {
        self.kind == MessageKind::Stream
    }
}

/// Project a raw message into a [`ReducedEvent`].
///
/// `unread` and the stream name are optional; every other field must be present.
pub fn reduce(raw: &RawMessage) -> Result<ReducedEvent, MalformedEventError> {
    let id = raw.id.ok_or(MalformedEventError::MissingField("id"))?;
    let timestamp = raw
        .timestamp
        .ok_or(MalformedEventError::MissingField("timestamp"))?;
    let stream_id = raw
        .stream_id
        .ok_or(MalformedEventError::MissingField("stream_id"))?;
    let topic = raw
        .topic
        .clone()
        .ok_or(MalformedEventError::MissingField("topic"))?;
    let sender_id = raw
        .sender_id
        .ok_or(MalformedEventError::MissingField("sender_id"))?;
    let kind = raw
        .message_type
        .as_deref()
        .map(MessageKind::from_type)
        .ok_or(MalformedEventError::MissingField("type"))?;

    Ok(ReducedEvent {
        id,
        timestamp,
        stream_id,
        topic,
        sender_id,
        unread: raw.unread.unwrap_or(false),
        kind,
        stream_name: raw.stream_name.clone(),
    })
}

/// Reduce a whole batch, failing on the first malformed record.
pub fn reduce_all(raws: &[RawMessage]) -> Result<Vec<ReducedEvent>, MalformedEventError> {
    raws.iter().map(reduce).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_message() -> RawMessage {
        RawMessage {
            id: Some(7),
            timestamp: Some(1000),
            stream_id: Some(1),
            stream_name: Some("general".to_string()),
            topic: Some("topic-1".to_string()),
            sender_id: Some(2),
            unread: Some(true),
            message_type: Some("stream".to_string()),
        }
    }

    #[test]
    fn test_reduce_full_message() {
        let event = reduce(&full_message()).unwrap();
        assert_eq!(event.id, 7);
        assert_eq!(event.timestamp, 1000);
        assert_eq!(event.stream_id, 1);
        assert_eq!(event.topic, "topic-1");
        assert_eq!(event.sender_id, 2);
        assert!(event.unread);
        assert_eq!(event.kind, MessageKind::Stream);
        assert_eq!(event.stream_name.as_deref(), Some("general"));
    }

    #[test]
    fn test_reduce_defaults_unread_to_false() {
        let mut raw = full_message();
        raw.unread = None;
        raw.stream_name = None;
        let event = reduce(&raw).unwrap();
        assert!(!event.unread);
        assert!(event.stream_name.is_none());
    }

    #[test]
    fn test_reduce_rejects_each_missing_field() {
        let cases: [(&'static str, fn(&mut RawMessage)); 6] = [
            ("id", |m| m.id = None),
            ("timestamp", |m| m.timestamp = None),
            ("stream_id", |m| m.stream_id = None),
            ("topic", |m| m.topic = None),
            ("sender_id", |m| m.sender_id = None),
            ("type", |m| m.message_type = None),
        ];

        for (field, strip) in cases {
            let mut raw = full_message();
            strip(&mut raw);
            assert_eq!(
                reduce(&raw),
                Err(MalformedEventError::MissingField(field)),
                "missing {} should be rejected",
                field
            );
        }
    }

    #[test]
    fn test_non_stream_type_is_other() {
        let mut raw = full_message();
        raw.message_type = Some("private".to_string());
        assert_eq!(reduce(&raw).unwrap().kind, MessageKind::Other);
        assert!(!raw.is_stream());
    }

    #[test]
    fn test_from_json_accepts_subject_alias() {
        let json = r#"{
            "id": 3,
            "timestamp": 1010,
            "stream_id": 1,
            "stream": "general",
            "subject": "topic-2",
            "sender_id": 1,
            "type": "stream"
        }"#;
        let raw = RawMessage::from_json(json).unwrap();
        assert_eq!(raw.topic.as_deref(), Some("topic-2"));
        assert_eq!(raw.stream_name.as_deref(), Some("general"));
        assert!(raw.is_stream());
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let result = RawMessage::from_json("not json");
        assert!(matches!(result, Err(MalformedEventError::InvalidJson(_))));
    }

    #[test]
    fn test_from_value_wrong_field_type() {
        let value = serde_json::json!({ "id": "seven" });
        assert!(matches!(
            RawMessage::from_value(&value),
            Err(MalformedEventError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_reduce_all_fails_on_first_bad_record() {
        let mut bad = full_message();
        bad.sender_id = None;
        let result = reduce_all(&[full_message(), bad]);
        assert_eq!(result, Err(MalformedEventError::MissingField("sender_id")));
    }
}
