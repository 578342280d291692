use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use recent_topics_core::sources::{CurrentUser, MessageLog, MutedTopics, UnreadCounts};
use recent_topics_core::{RawMessage, RecentTopics, TopicKey, TopicRow};
use serde::Serialize;
use tracing::info;

use super::config::CliConfig;
use super::protocol::CliCommand;

/// Read a JSON array of raw messages.
pub fn load_messages(path: &Path) -> Result<Vec<RawMessage>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read messages file: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse messages file: {}", path.display()))
}

/// A recent topics index fed from a recorded message log.
pub struct Session {
    pub recent: RecentTopics,
    pub log: Arc<MessageLog>,
    pub mutes: Arc<MutedTopics>,
    pub unread: Arc<UnreadCounts>,
}

impl Session {
    /// Build the collaborators from `config` and ingest `messages` as one batch.
    pub fn replay(config: &CliConfig, messages: Vec<RawMessage>) -> Result<Self> {
        let user_id = config
            .user_id
            .ok_or_else(|| anyhow!("No user id configured (set userId or pass --user-id)"))?;

        let mutes = Arc::new(MutedTopics::from_keys(config.muted_topics.iter().cloned()));
        let unread = Arc::new(UnreadCounts::from_counts(
            config.unread_counts.iter().map(|c| (c.key(), c.count)),
        ));
        let log = Arc::new(MessageLog::from_messages(messages));

        let mut recent = RecentTopics::new(
            Arc::new(CurrentUser(user_id)),
            mutes.clone(),
            unread.clone(),
            log.clone(),
        );
        let accepted = recent
            .process_messages(&log.all())
            .context("Failed to ingest message log")?;
        info!(
            messages = log.len(),
            accepted,
            tracked = recent.len(),
            "replayed message log"
        );

        Ok(Self {
            recent,
            log,
            mutes,
            unread,
        })
    }

    pub fn execute(&mut self, command: &CliCommand) -> Result<serde_json::Value> {
        let value = match command {
            CliCommand::Snapshot => serde_json::to_value(self.recent.snapshot())?,
            CliCommand::Relevant => serde_json::to_value(self.recent.relevant_snapshot())?,
            CliCommand::UnreadTotal => {
                serde_json::json!({ "unreadTotal": self.recent.unread_total() })
            }
            CliCommand::Rows => {
                let rows: Vec<RowOutput> =
                    self.recent.rows().into_iter().map(RowOutput::from).collect();
                serde_json::to_value(rows)?
            }
            CliCommand::Move { from, to } => {
                let moved = self.log.rename_topic(from, to);
                self.recent
                    .process_topic_moved(from, to)
                    .with_context(|| format!("Failed to rebuild topic {}", from))?;
                info!(from = %from, to = %to, moved, "moved topic");
                serde_json::to_value(self.recent.snapshot())?
            }
        };
        Ok(value)
    }
}

/// Display row with a human-readable time
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowOutput {
    #[serde(flatten)]
    pub row: TopicRow,
    pub last_activity: String,
}

impl From<TopicRow> for RowOutput {
    fn from(row: TopicRow) -> Self {
        let last_activity = format_timestamp(row.last_timestamp);
        Self { row, last_activity }
    }
}

pub fn format_timestamp(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|time| time.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| secs.to_string())
}
