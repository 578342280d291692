use std::cmp::Ordering;

use tracing::debug;

use crate::models::{TopicEntry, TopicKey, TopicRow, TopicSummary};
use crate::sources::UnreadCounter;
use crate::store::topic_index::TopicIndex;

/// Tracked topics whose latest message has not been seen, in storage order.
pub fn relevant(index: &TopicIndex) -> Vec<(&TopicKey, &TopicEntry)> {
    index
        .all_entries()
        .filter(|(key, entry)| {
            if entry.read {
                return false;
            }
            // Messages we author are never flagged unread upstream
            debug_assert!(
                entry.others_replied(),
                "topic {} is unread but its latest message is our own",
                key
            );
            true
        })
        .collect()
}

/// Evict every muted topic from the index. Returns how many were removed.
pub fn apply_mutes(index: &mut TopicIndex, muted: &[TopicKey]) -> usize {
    let mut evicted = 0;
    for key in muted {
        if index.delete(key).is_some() {
            debug!(topic = %key, "evicted muted topic");
            evicted += 1;
        }
    }
    evicted
}

/// Most recent activity first; same-second ties resolved by message id.
fn by_recency(a: &TopicEntry, b: &TopicEntry) -> Ordering {
    b.last_message
        .timestamp
        .cmp(&a.last_message.timestamp)
        .then_with(|| b.last_message.id.cmp(&a.last_message.id))
}

/// Sort entries for display without touching the index.
pub fn ordered<'a>(
    entries: impl IntoIterator<Item = (&'a TopicKey, &'a TopicEntry)>,
) -> Vec<(&'a TopicKey, &'a TopicEntry)> {
    let mut sorted: Vec<_> = entries.into_iter().collect();
    sorted.sort_by(|(_, a), (_, b)| by_recency(a, b));
    sorted
}

/// Total unread messages across tracked topics, as reported by `counter`.
pub fn unread_total(index: &TopicIndex, counter: &dyn UnreadCounter) -> u64 {
    index
        .all_entries()
        .map(|(_, entry)| {
            counter.unread_count(
                entry.our_last_message.stream_id,
                &entry.our_last_message.topic,
            )
        })
        .sum()
}

pub fn summaries<'a>(
    entries: impl IntoIterator<Item = (&'a TopicKey, &'a TopicEntry)>,
) -> Vec<TopicSummary> {
    entries
        .into_iter()
        .map(|(key, entry)| TopicSummary::new(key, entry))
        .collect()
}

/// Display rows for every tracked topic, newest first.
pub fn rows(index: &TopicIndex, counter: &dyn UnreadCounter) -> Vec<TopicRow> {
    ordered(index.all_entries())
        .into_iter()
        .map(|(key, entry)| TopicRow {
            stream_id: key.stream_id,
            stream_name: entry.last_message.stream_name.clone(),
            topic: key.topic.clone(),
            unread_count: counter.unread_count(key.stream_id, &key.topic),
            last_timestamp: entry.last_activity(),
            read: entry.read,
            senders: entry.senders.clone(),
        })
        .collect()
}
