use recent_topics_core::TopicKey;

/// Commands a session can execute against its replayed index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Snapshot,
    Relevant,
    UnreadTotal,
    Rows,
    /// Rewrite the log so `from` lives at `to`, then rebuild both keys
    Move { from: TopicKey, to: TopicKey },
}

impl CliCommand {
    pub fn topic_move(
        stream_id: u64,
        old_topic: impl Into<String>,
        new_topic: impl Into<String>,
        new_stream_id: Option<u64>,
    ) -> Self {
        CliCommand::Move {
            from: TopicKey::new(stream_id, old_topic),
            to: TopicKey::new(new_stream_id.unwrap_or(stream_id), new_topic),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_move_defaults_to_same_stream() {
        assert_eq!(
            CliCommand::topic_move(3, "a", "b", None),
            CliCommand::Move {
                from: TopicKey::new(3, "a"),
                to: TopicKey::new(3, "b"),
            }
        );
        assert_eq!(
            CliCommand::topic_move(3, "a", "a", Some(4)),
            CliCommand::Move {
                from: TopicKey::new(3, "a"),
                to: TopicKey::new(4, "a"),
            }
        );
    }
}
