//! External collaborators consumed by the recent topics index.
//!
//! The index never owns identity, mute, unread or history state; it asks these
//! sources. The in-memory implementations keep their state behind a
//! `parking_lot::RwLock` so a caller can hold an `Arc` to the same source and
//! update it between ingestion steps.

use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

use crate::models::{RawMessage, TopicKey};

/// Identity oracle for the logged-in user.
pub trait Identity: Send + Sync {
    fn is_my_user_id(&self, sender_id: u64) -> bool;
}

/// Current set of muted topics.
pub trait MuteSource: Send + Sync {
    fn muted_topics(&self) -> Vec<TopicKey>;
}

/// Per-topic unread counts, maintained elsewhere.
pub trait UnreadCounter: Send + Sync {
    fn unread_count(&self, stream_id: u64, topic: &str) -> u64;
}

/// Authoritative message history, used when a topic has to be rebuilt.
pub trait MessageSource: Send + Sync {
    fn all_messages_for(&self, stream_id: u64, topic: &str) -> Vec<RawMessage>;
}

// =============================================================================
// In-memory implementations
// =============================================================================

/// Fixed current user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub u64);

impl Identity for CurrentUser {
    fn is_my_user_id(&self, sender_id: u64) -> bool {
        self.0 == sender_id
    }
}

#[derive(Debug, Default)]
pub struct MutedTopics {
    muted: RwLock<HashSet<TopicKey>>,
}

impl MutedTopics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_keys(keys: impl IntoIterator<Item = TopicKey>) -> Self {
        Self {
            muted: RwLock::new(keys.into_iter().collect()),
        }
    }

    pub fn mute(&self, key: TopicKey) {
        self.muted.write().insert(key);
    }

    pub fn unmute(&self, key: &TopicKey) -> bool {
        self.muted.write().remove(key)
    }
}

impl MuteSource for MutedTopics {
    fn muted_topics(&self) -> Vec<TopicKey> {
        let mut keys: Vec<TopicKey> = self.muted.read().iter().cloned().collect();
        keys.sort();
        keys
    }
}

#[derive(Debug, Default)]
pub struct UnreadCounts {
    counts: RwLock<HashMap<TopicKey, u64>>,
}

impl UnreadCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_counts(counts: impl IntoIterator<Item = (TopicKey, u64)>) -> Self {
        Self {
            counts: RwLock::new(counts.into_iter().collect()),
        }
    }

    /// Overwrite the count for a topic; zero removes it.
    pub fn set(&self, key: TopicKey, count: u64) {
        let mut counts = self.counts.write();
        if count == 0 {
            counts.remove(&key);
        } else {
            counts.insert(key, count);
        }
    }
}

impl UnreadCounter for UnreadCounts {
    fn unread_count(&self, stream_id: u64, topic: &str) -> u64 {
        self.counts
            .read()
            .get(&TopicKey::new(stream_id, topic))
            .copied()
            .unwrap_or(0)
    }
}

/// Message history in arrival order.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: RwLock<Vec<RawMessage>>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_messages(messages: Vec<RawMessage>) -> Self {
        Self {
            messages: RwLock::new(messages),
        }
    }

    pub fn push(&self, message: RawMessage) {
        self.messages.write().push(message);
    }

    pub fn len(&self) -> usize {
        self.messages.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.read().is_empty()
    }

    pub fn all(&self) -> Vec<RawMessage> {
        self.messages.read().clone()
    }

    /// Rewrite every stream message in `from` so it belongs to `to`.
    /// Returns how many messages moved.
    pub fn rename_topic(&self, from: &TopicKey, to: &TopicKey) -> usize {
        let mut moved = 0;
        for message in self.messages.write().iter_mut() {
            if message.is_stream()
                && message.stream_id == Some(from.stream_id)
                && message.topic.as_deref() == Some(from.topic.as_str())
            {
                message.stream_id = Some(to.stream_id);
                message.topic = Some(to.topic.clone());
                moved += 1;
            }
        }
        moved
    }
}

impl MessageSource for MessageLog {
    fn all_messages_for(&self, stream_id: u64, topic: &str) -> Vec<RawMessage> {
        self.messages
            .read()
            .iter()
            .filter(|m| {
                m.is_stream() && m.stream_id == Some(stream_id) && m.topic.as_deref() == Some(topic)
            })
            .cloned()
            .collect()
    }
}
