use serde::{Deserialize, Serialize};
use std::fmt;

use super::message::ReducedEvent;

/// Identity of a tracked topic: (stream id, topic name).
/// Matching is exact; no case folding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicKey {
    pub stream_id: u64,
    pub topic: String,
}

impl TopicKey {
    pub fn new(stream_id: u64, topic: impl Into<String>) -> Self {
        Self {
            stream_id,
            topic: topic.into(),
        }
    }

    pub fn of(event: &ReducedEvent) -> Self {
        Self::new(event.stream_id, event.topic.clone())
    }
}

impl fmt::Display for TopicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.stream_id, self.topic)
    }
}

/// Per-topic state kept by the topic index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicEntry {
    /// Latest message the current user posted here
    pub our_last_message: ReducedEvent,
    /// Latest message from anyone
    pub last_message: ReducedEvent,
    /// Whether `last_message` has been seen
    pub read: bool,
    /// Unique sender ids, most recently applied last
    pub senders: Vec<u64>,
}

impl TopicEntry {
    /// Start tracking a topic from the user's first message in it
    pub fn from_own_message(event: ReducedEvent) -> Self {
        Self {
            read: !event.unread,
            senders: vec![event.sender_id],
            our_last_message: event.clone(),
            last_message: event,
        }
    }

    /// Whether the latest message is someone else's reply rather than our own post.
    pub fn others_replied(&self) -> bool {
        self.last_message.id != self.our_last_message.id
    }

    /// Move `sender_id` to the most-recent end of the sender list.
    pub fn touch_sender(&mut self, sender_id: u64) {
        // TODO: switch to an ordered set if per-topic participant counts grow large
        self.senders.retain(|&s| s != sender_id);
        self.senders.push(sender_id);
    }

    pub fn last_activity(&self) -> u64 {
        self.last_message.timestamp
    }
}

/// Compact view of a tracked topic, as returned by snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub key: TopicKey,
    pub read: bool,
    pub our_last_message_id: u64,
    pub last_message_id: u64,
}

impl TopicSummary {
    pub fn new(key: &TopicKey, entry: &TopicEntry) -> Self {
        Self {
            key: key.clone(),
            read: entry.read,
            our_last_message_id: entry.our_last_message.id,
            last_message_id: entry.last_message.id,
        }
    }
}

/// Display row for the recent topics list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRow {
    pub stream_id: u64,
    pub stream_name: Option<String>,
    pub topic: String,
    pub unread_count: u64,
    /// Unix seconds of the latest message
    pub last_timestamp: u64,
    pub read: bool,
    pub senders: Vec<u64>,
}
