use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use recent_topics_cli::cli::{load_messages, CliCommand, CliConfig, Session};

#[derive(Parser)]
#[command(name = "recent-topics")]
#[command(about = "Replay a message log and inspect the recent topics it produces")]
struct Cli {
    /// Path to JSON config file (userId, mutedTopics, unreadCounts)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// JSON array of raw messages, oldest first
    #[arg(long, short = 'm')]
    messages: PathBuf,

    /// Override the configured user id
    #[arg(long)]
    user_id: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// All tracked topics, newest first
    Snapshot,

    /// Tracked topics with an unread latest message
    Relevant,

    /// Sum of unread counts across tracked topics
    UnreadTotal,

    /// Display rows with stream names, senders and times
    Rows,

    /// Move a topic and rebuild the affected keys
    Move {
        #[arg(long)]
        stream_id: u64,
        #[arg(long)]
        old_topic: String,
        #[arg(long)]
        new_topic: String,
        /// Destination stream (defaults to the source stream)
        #[arg(long)]
        new_stream_id: Option<u64>,
    },
}

impl From<Commands> for CliCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Snapshot => CliCommand::Snapshot,
            Commands::Relevant => CliCommand::Relevant,
            Commands::UnreadTotal => CliCommand::UnreadTotal,
            Commands::Rows => CliCommand::Rows,
            Commands::Move {
                stream_id,
                old_topic,
                new_topic,
                new_stream_id,
            } => CliCommand::topic_move(stream_id, old_topic, new_topic, new_stream_id),
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let mut config = CliConfig::load_or_default(cli.config.as_deref())?;
    if cli.user_id.is_some() {
        config.user_id = cli.user_id;
    }

    let messages = load_messages(&cli.messages)?;
    let mut session = Session::replay(&config, messages)?;
    let output = session.execute(&cli.command.into())?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(rendered)
}

fn main() {
    recent_topics_core::tracing_setup::init_tracing();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
