pub mod recent_topics;
pub mod topic_index;
pub mod update;
pub mod views;

pub use recent_topics::RecentTopics;
pub use topic_index::TopicIndex;
pub use update::{apply, load_history, process_events, rebuild_topic, replace_topic};
pub use views::{apply_mutes, ordered, relevant, rows, unread_total};
