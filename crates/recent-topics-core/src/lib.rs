pub mod constants;
pub mod models;
pub mod sources;
pub mod store;
pub mod tracing_setup;

pub use models::{MalformedEventError, RawMessage, TopicKey, TopicRow, TopicSummary};
pub use store::RecentTopics;
