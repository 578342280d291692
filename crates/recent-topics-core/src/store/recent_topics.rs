use std::sync::Arc;

use tracing::{debug, info};

use crate::models::{
    reduce, reduce_all, MalformedEventError, RawMessage, ReducedEvent, TopicEntry, TopicKey,
    TopicRow, TopicSummary,
};
use crate::sources::{Identity, MessageSource, MuteSource, UnreadCounter};
use crate::store::topic_index::TopicIndex;
use crate::store::{update, views};

/// Recent conversations view - single owner of the topic index.
///
/// Rebuilt from the live message stream each session and updated incrementally
/// on every new message. Identity, mutes, unread counts and message history are
/// supplied by the surrounding application.
pub struct RecentTopics {
    index: TopicIndex,
    identity: Arc<dyn Identity>,
    mutes: Arc<dyn MuteSource>,
    unread: Arc<dyn UnreadCounter>,
    messages: Arc<dyn MessageSource>,
}

impl RecentTopics {
    pub fn new(
        identity: Arc<dyn Identity>,
        mutes: Arc<dyn MuteSource>,
        unread: Arc<dyn UnreadCounter>,
        messages: Arc<dyn MessageSource>,
    ) -> Self {
        Self {
            index: TopicIndex::new(),
            identity,
            mutes,
            unread,
            messages,
        }
    }

    /// Forget everything (session re-initialization).
    pub fn clear(&mut self) {
        info!(tracked = self.index.len(), "clearing recent topics");
        self.index.clear();
    }

    // ===== Ingestion =====

    /// Apply a single message. Mutes are not re-applied; see [`Self::process_messages`].
    pub fn process_message(&mut self, raw: &RawMessage) -> Result<bool, MalformedEventError> {
        let event = reduce(raw)?;
        Ok(update::apply(&mut self.index, event, self.identity.as_ref()))
    }

    /// Apply a batch in the given order, then evict muted topics.
    ///
    /// The whole batch is validated first: one malformed record rejects the batch
    /// and leaves the index untouched. Returns how many messages were accepted.
    pub fn process_messages(&mut self, raws: &[RawMessage]) -> Result<usize, MalformedEventError> {
        let events = reduce_all(raws)?;
        let accepted = update::process_events(&mut self.index, events, self.identity.as_ref());
        self.update_muted_topics();
        Ok(accepted)
    }

    /// Re-apply the current mute set. Returns how many topics were evicted.
    pub fn update_muted_topics(&mut self) -> usize {
        views::apply_mutes(&mut self.index, &self.mutes.muted_topics())
    }

    /// A topic was renamed or moved away: rebuild the old key from history.
    pub fn process_topic_move(
        &mut self,
        stream_id: u64,
        old_topic: &str,
    ) -> Result<usize, MalformedEventError> {
        self.rebuild(&TopicKey::new(stream_id, old_topic))
    }

    /// Rebuild both ends of a move, so merged or renamed topics reflect the full
    /// history at their new key.
    ///
    /// Both histories are reduced before either key is replaced; a malformed
    /// record leaves the index untouched.
    pub fn process_topic_moved(
        &mut self,
        old: &TopicKey,
        new: &TopicKey,
    ) -> Result<usize, MalformedEventError> {
        let old_events = update::load_history(old, self.messages.as_ref())?;
        let new_events = if new != old {
            Some(update::load_history(new, self.messages.as_ref())?)
        } else {
            None
        };

        let mut accepted = self.replace(old, old_events);
        if let Some(events) = new_events {
            accepted += self.replace(new, events);
        }
        debug!(from = %old, to = %new, accepted, "rebuilt moved topic");
        Ok(accepted)
    }

    fn replace(&mut self, key: &TopicKey, events: Vec<ReducedEvent>) -> usize {
        update::replace_topic(
            &mut self.index,
            key,
            events,
            self.identity.as_ref(),
            self.mutes.as_ref(),
        )
    }

    fn rebuild(&mut self, key: &TopicKey) -> Result<usize, MalformedEventError> {
        update::rebuild_topic(
            &mut self.index,
            key,
            self.messages.as_ref(),
            self.identity.as_ref(),
            self.mutes.as_ref(),
        )
    }

    // ===== Views =====

    pub fn get(&self, key: &TopicKey) -> Option<&TopicEntry> {
        self.index.get_entry(key)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All tracked topics, newest first.
    pub fn snapshot(&self) -> Vec<TopicSummary> {
        views::summaries(views::ordered(self.index.all_entries()))
    }

    /// Tracked topics with an unseen latest message, newest first.
    pub fn relevant_snapshot(&self) -> Vec<TopicSummary> {
        views::summaries(views::ordered(views::relevant(&self.index)))
    }

    pub fn unread_total(&self) -> u64 {
        views::unread_total(&self.index, self.unread.as_ref())
    }

    pub fn rows(&self) -> Vec<TopicRow> {
        views::rows(&self.index, self.unread.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{CurrentUser, MessageLog, MutedTopics, UnreadCounts};

    const STREAM: u64 = 1;
    const ME: u64 = 1;
    const OTHER: u64 = 2;

    struct Fixture {
        recent: RecentTopics,
        mutes: Arc<MutedTopics>,
        unread: Arc<UnreadCounts>,
        log: Arc<MessageLog>,
    }

    fn fixture() -> Fixture {
        let mutes = Arc::new(MutedTopics::new());
        let unread = Arc::new(UnreadCounts::new());
        let log = Arc::new(MessageLog::new());
        let recent = RecentTopics::new(
            Arc::new(CurrentUser(ME)),
            mutes.clone(),
            unread.clone(),
            log.clone(),
        );
        Fixture {
            recent,
            mutes,
            unread,
            log,
        }
    }

    fn message(id: u64, timestamp: u64, topic: &str, sender_id: u64, unread: bool) -> RawMessage {
        RawMessage {
            id: Some(id),
            timestamp: Some(timestamp),
            stream_id: Some(STREAM),
            stream_name: Some("stream1".to_string()),
            topic: Some(topic.to_string()),
            sender_id: Some(sender_id),
            unread: Some(unread),
            message_type: Some("stream".to_string()),
        }
    }

    fn key(topic: &str) -> TopicKey {
        TopicKey::new(STREAM, topic)
    }

    fn find<'a>(summaries: &'a [TopicSummary], topic: &str) -> Option<&'a TopicSummary> {
        summaries.iter().find(|s| s.key == key(topic))
    }

    fn topic_names(summaries: &[TopicSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.key.topic.as_str()).collect()
    }

    /// Six topics in one stream:
    /// - topic-1: only our message
    /// - topic-2: our message, then another user's message we've read
    /// - topic-3 / topic-4: we never posted (unread / read)
    /// - topic-5 / topic-6: our message, then another user's unread message
    fn basic_messages() -> Vec<RawMessage> {
        vec![
            message(1, 1000, "topic-1", ME, false),
            message(2, 1010, "topic-2", ME, false),
            message(3, 1011, "topic-2", OTHER, false),
            message(4, 1020, "topic-3", OTHER, true),
            message(5, 1030, "topic-4", OTHER, false),
            message(6, 1040, "topic-5", ME, false),
            message(7, 1041, "topic-5", OTHER, true),
            message(8, 1050, "topic-6", ME, false),
            message(9, 1051, "topic-6", OTHER, true),
        ]
    }

    #[test]
    fn test_basic_scenario() {
        let mut f = fixture();
        f.recent.process_messages(&basic_messages()).unwrap();

        let all = f.recent.snapshot();
        let relevant = f.recent.relevant_snapshot();
        assert_eq!(all.len(), 4);
        assert_eq!(relevant.len(), 2);

        assert!(find(&all, "topic-1").unwrap().read);
        assert!(find(&relevant, "topic-1").is_none());

        assert!(find(&all, "topic-2").unwrap().read);
        assert!(find(&relevant, "topic-2").is_none());

        assert!(find(&all, "topic-3").is_none());
        assert!(find(&all, "topic-4").is_none());

        assert!(!find(&all, "topic-5").unwrap().read);
        assert!(find(&relevant, "topic-5").is_some());
        assert!(!find(&all, "topic-6").unwrap().read);
        assert!(find(&relevant, "topic-6").is_some());

        // Newest first
        assert_eq!(
            topic_names(&all),
            vec!["topic-6", "topic-5", "topic-2", "topic-1"]
        );
    }

    #[test]
    fn test_basic_scenario_follow_up_events() {
        let mut f = fixture();
        f.recent.process_messages(&basic_messages()).unwrap();

        // New unread message to topic-1
        f.recent.process_message(&message(10, 1011, "topic-1", OTHER, true)).unwrap();
        // Older message to topic-5 read: latest stays unread
        f.recent.process_message(&message(11, 1040, "topic-5", OTHER, false)).unwrap();
        // New unread message to topic-5
        f.recent.process_message(&message(12, 1043, "topic-5", OTHER, true)).unwrap();
        // New read message to topic-6
        f.recent.process_message(&message(13, 1052, "topic-6", OTHER, false)).unwrap();

        let all = f.recent.snapshot();
        let relevant = f.recent.relevant_snapshot();
        assert_eq!(all.len(), 4);
        assert_eq!(topic_names(&relevant), vec!["topic-5", "topic-1"]);

        let topic1 = find(&all, "topic-1").unwrap();
        assert!(!topic1.read);
        assert_eq!(topic1.our_last_message_id, 1);
        assert_eq!(topic1.last_message_id, 10);

        assert_eq!(find(&all, "topic-5").unwrap().last_message_id, 12);
        assert!(find(&all, "topic-6").unwrap().read);
        assert!(find(&relevant, "topic-6").is_none());
    }

    #[test]
    fn test_untracked_topic_messages_are_ignored() {
        let mut f = fixture();
        assert!(!f.recent.process_message(&message(1, 1000, "x", OTHER, true)).unwrap());
        assert!(f.recent.is_empty());
        assert!(f.recent.process_message(&message(2, 1001, "x", ME, false)).unwrap());
        assert_eq!(f.recent.len(), 1);
    }

    #[test]
    fn test_mute_scenario() {
        let mut f = fixture();
        f.recent.process_messages(&basic_messages()).unwrap();

        f.mutes.mute(key("topic-5"));
        assert_eq!(f.recent.update_muted_topics(), 1);
        assert!(find(&f.recent.snapshot(), "topic-5").is_none());
        assert_eq!(f.recent.len(), 3);

        // Others' messages alone don't bring it back
        f.recent.process_message(&message(20, 1100, "topic-5", OTHER, true)).unwrap();
        assert!(f.recent.get(&key("topic-5")).is_none());

        // Still muted: a batch evicts it again
        f.recent.process_messages(&[message(21, 1101, "topic-5", ME, false)]).unwrap();
        assert!(f.recent.get(&key("topic-5")).is_none());

        // Unmuted: our next message re-creates it
        f.mutes.unmute(&key("topic-5"));
        f.recent.process_messages(&[message(22, 1102, "topic-5", ME, false)]).unwrap();
        let entry = f.recent.get(&key("topic-5")).unwrap();
        assert_eq!(entry.our_last_message.id, 22);
        assert_eq!(entry.senders, vec![ME]);
    }

    #[test]
    fn test_batch_with_malformed_message_is_rejected_whole() {
        let mut f = fixture();
        let mut broken = message(3, 1002, "b", ME, false);
        broken.timestamp = None;

        let result = f.recent.process_messages(&[message(1, 1000, "a", ME, false), broken]);
        assert_eq!(result, Err(MalformedEventError::MissingField("timestamp")));
        assert!(f.recent.is_empty());
    }

    #[test]
    fn test_malformed_single_message_leaves_index_unchanged() {
        let mut f = fixture();
        f.recent.process_message(&message(1, 1000, "a", ME, false)).unwrap();

        let mut broken = message(2, 1001, "a", OTHER, true);
        broken.sender_id = None;
        assert!(f.recent.process_message(&broken).is_err());

        let entry = f.recent.get(&key("a")).unwrap();
        assert_eq!(entry.last_message.id, 1);
        assert!(entry.read);
    }

    #[test]
    fn test_unread_total() {
        let mut f = fixture();
        f.recent.process_messages(&basic_messages()).unwrap();

        f.unread.set(key("topic-5"), 1);
        f.unread.set(key("topic-6"), 2);
        // Untracked topics don't count
        f.unread.set(key("topic-3"), 10);

        assert_eq!(f.recent.unread_total(), 3);
    }

    #[test]
    fn test_topic_move_rebuilds_from_history() {
        let mut f = fixture();
        for m in basic_messages() {
            f.log.push(m);
        }
        f.recent.process_messages(&f.log.all()).unwrap();
        assert!(f.recent.get(&key("topic-5")).is_some());

        // Server renamed topic-5 to lunch
        f.log.rename_topic(&key("topic-5"), &key("lunch"));
        f.recent.process_topic_moved(&key("topic-5"), &key("lunch")).unwrap();

        assert!(f.recent.get(&key("topic-5")).is_none());
        let lunch = f.recent.get(&key("lunch")).unwrap();
        assert_eq!(lunch.our_last_message.id, 6);
        assert_eq!(lunch.last_message.id, 7);
        assert!(!lunch.read);
        assert_eq!(f.recent.len(), 4);
    }

    #[test]
    fn test_topic_move_old_key_only() {
        let mut f = fixture();
        f.log.push(message(1, 1000, "a", ME, false));
        f.recent.process_messages(&f.log.all()).unwrap();

        // History unchanged: rebuilding restores the same state
        let before = f.recent.get(&key("a")).cloned();
        f.recent.process_topic_move(STREAM, "a").unwrap();
        assert_eq!(f.recent.get(&key("a")).cloned(), before);

        // Unknown key is a no-op
        assert_eq!(f.recent.process_topic_move(STREAM, "missing").unwrap(), 0);
        assert_eq!(f.recent.len(), 1);
    }

    #[test]
    fn test_topic_move_with_malformed_history_changes_nothing() {
        let mut f = fixture();
        f.log.push(message(1, 1000, "a", ME, false));
        f.recent.process_messages(&f.log.all()).unwrap();
        let before = f.recent.get(&key("a")).cloned();

        let mut broken = message(2, 1001, "a", OTHER, true);
        broken.id = None;
        f.log.push(broken);
        assert_eq!(
            f.recent.process_topic_move(STREAM, "a"),
            Err(MalformedEventError::MissingField("id"))
        );
        assert_eq!(f.recent.len(), 1);
        assert_eq!(f.recent.get(&key("a")).cloned(), before);

        // Source history is clean, destination history is not
        let own = message(3, 1002, "c", ME, false);
        f.log.push(own.clone());
        f.recent.process_message(&own).unwrap();
        let mut broken = message(4, 1003, "b", OTHER, true);
        broken.timestamp = None;
        f.log.push(broken);

        let tracked_c = f.recent.get(&key("c")).cloned();
        assert!(f.recent.process_topic_moved(&key("c"), &key("b")).is_err());
        assert_eq!(f.recent.get(&key("c")).cloned(), tracked_c);
        assert_eq!(f.recent.get(&key("a")).cloned(), before);
        assert_eq!(f.recent.len(), 2);
    }

    #[test]
    fn test_own_unread_message_is_not_relevant() {
        let mut f = fixture();
        f.recent.process_message(&message(1, 1000, "a", ME, true)).unwrap();
        assert!(f.recent.relevant_snapshot().is_empty());
        assert!(f.recent.get(&key("a")).unwrap().read);
    }

    #[test]
    fn test_rows_and_clear() {
        let mut f = fixture();
        f.recent.process_messages(&basic_messages()).unwrap();
        f.unread.set(key("topic-6"), 1);

        let rows = f.recent.rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].topic, "topic-6");
        assert_eq!(rows[0].unread_count, 1);
        assert_eq!(rows[0].stream_name.as_deref(), Some("stream1"));

        f.recent.clear();
        assert!(f.recent.is_empty());
        assert!(f.recent.snapshot().is_empty());
        assert_eq!(f.recent.unread_total(), 0);
    }
}
