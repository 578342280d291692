//! Incremental update rule for the topic index.
//!
//! A topic starts being tracked on the first stream message the current user
//! posts to it. From then on every message to that topic is applied:
//! - `our_last_message` follows the user's own messages by timestamp
//! - `last_message` and `read` follow everyone's messages by timestamp
//! - `senders` is moved-to-end in application order
//!
//! An unread flag on the user's own message is ignored.
//!
//! Timestamp comparisons use `>=`, so an incoming event wins a tie. Replaying
//! the same event is therefore idempotent, and the two last-message fields do
//! not depend on the order a batch is applied in. `senders` does.

use tracing::{debug, trace, warn};

use crate::models::{reduce_all, MalformedEventError, ReducedEvent, TopicEntry, TopicKey};
use crate::sources::{Identity, MessageSource, MuteSource};
use crate::store::topic_index::TopicIndex;
use crate::store::views::apply_mutes;

/// Apply one event to the index.
///
/// Returns `true` if the event was accepted (created or updated an entry),
/// `false` if it was ignored because its topic is not tracked and the event
/// cannot start tracking it.
pub fn apply(index: &mut TopicIndex, mut event: ReducedEvent, identity: &dyn Identity) -> bool {
    let is_ours = identity.is_my_user_id(event.sender_id);
    if is_ours && event.unread {
        // Our own messages are always read
        trace!(message_id = event.id, "clearing unread flag on own message");
        event.unread = false;
    }
    let is_relevant = is_ours && event.is_stream();
    let key = TopicKey::of(&event);

    let Some(entry) = index.get_entry_mut(&key) else {
        if !is_relevant {
            trace!(topic = %key, message_id = event.id, "ignoring message for untracked topic");
            return false;
        }
        debug!(topic = %key, message_id = event.id, "tracking new topic");
        index.insert(key, TopicEntry::from_own_message(event));
        return true;
    };

    if is_ours && event.timestamp >= entry.our_last_message.timestamp {
        entry.our_last_message = event.clone();
    }

    let sender_id = event.sender_id;
    if event.timestamp >= entry.last_message.timestamp {
        entry.read = !event.unread;
        entry.last_message = event;
    }
    entry.touch_sender(sender_id);

    true
}

/// Apply events in the order given. Returns how many were accepted.
pub fn process_events(
    index: &mut TopicIndex,
    events: impl IntoIterator<Item = ReducedEvent>,
    identity: &dyn Identity,
) -> usize {
    let mut accepted = 0;
    let mut seen = 0;
    for event in events {
        seen += 1;
        if apply(index, event, identity) {
            accepted += 1;
        }
    }
    debug!(seen, accepted, tracked = index.len(), "processed message batch");
    accepted
}

/// Reduce the authoritative history for `key`, in the order the source yields it.
pub fn load_history(
    key: &TopicKey,
    source: &dyn MessageSource,
) -> Result<Vec<ReducedEvent>, MalformedEventError> {
    let history = source.all_messages_for(key.stream_id, &key.topic);
    reduce_all(&history).map_err(|e| {
        warn!(topic = %key, error = %e, "topic history contains a malformed message");
        e
    })
}

/// Drop `key` and replay `events` in its place, then re-apply mutes.
pub fn replace_topic(
    index: &mut TopicIndex,
    key: &TopicKey,
    events: Vec<ReducedEvent>,
    identity: &dyn Identity,
    mutes: &dyn MuteSource,
) -> usize {
    if index.delete(key).is_some() {
        debug!(topic = %key, "dropped topic for rebuild");
    }
    let accepted = process_events(index, events, identity);
    apply_mutes(index, &mutes.muted_topics());
    accepted
}

/// Drop a topic and rebuild it from the authoritative history.
///
/// Used after a topic is renamed or merged. The history is reduced before the
/// entry is touched, so a malformed record returns the error and leaves the
/// index as it was.
pub fn rebuild_topic(
    index: &mut TopicIndex,
    key: &TopicKey,
    source: &dyn MessageSource,
    identity: &dyn Identity,
    mutes: &dyn MuteSource,
) -> Result<usize, MalformedEventError> {
    let events = load_history(key, source)?;
    Ok(replace_topic(index, key, events, identity, mutes))
}
