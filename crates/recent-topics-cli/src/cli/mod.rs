pub mod config;
pub mod protocol;
pub mod session;

pub use config::{default_config_path, CliConfig, UnreadCountConfig};
pub use protocol::CliCommand;
pub use session::{load_messages, RowOutput, Session};
