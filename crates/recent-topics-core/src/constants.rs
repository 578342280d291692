//! Shared constants
//!
//! Wire values and environment variable names used across modules.

/// `type` value carried by messages posted to a stream topic
pub const STREAM_MESSAGE_TYPE: &str = "stream";

/// When set, tracing also appends DEBUG-level output to this file
pub const LOG_FILE_ENV: &str = "RECENT_TOPICS_LOG_FILE";

/// Default filter directive when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
