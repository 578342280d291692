pub mod message;
pub mod topic;

pub use message::{reduce, reduce_all, MalformedEventError, MessageKind, RawMessage, ReducedEvent};
pub use topic::{TopicEntry, TopicKey, TopicRow, TopicSummary};
