use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use recent_topics_core::TopicKey;
use serde::{Deserialize, Serialize};

/// CLI configuration that can be loaded from a JSON file
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CliConfig {
    /// Id of the user whose recent topics are tracked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<u64>,

    /// Topics to evict after every batch
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub muted_topics: Vec<TopicKey>,

    /// Per-topic unread counts reported by the message system
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unread_counts: Vec<UnreadCountConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountConfig {
    pub stream_id: u64,
    pub topic: String,
    pub count: u64,
}

impl UnreadCountConfig {
    pub fn key(&self) -> TopicKey {
        TopicKey::new(self.stream_id, self.topic.clone())
    }
}

impl CliConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load from `path` if given, else from the default location if it exists,
    /// else fall back to an empty config.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize config")
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to serialize config")
    }
}

/// `<config dir>/recent-topics/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("recent-topics").join("config.json"))
}
