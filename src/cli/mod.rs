//! CLI entry point for threadloop.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Threadloop agent CLI
#[derive(Parser, Debug)]
#[command(name = "threadloop", version, about = "Tool-using conversational agent")]
pub struct Cli {
    /// Config file (defaults to threadloop.toml in the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the step budget for this run
    #[arg(long, global = true)]
    pub max_steps: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message on a thread and print the answer
    Chat(ChatArgs),
    /// Print the stored messages of a thread
    History(HistoryArgs),
    /// List threads with stored history
    Threads,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Thread to continue; a new one is started when omitted
    #[arg(short, long)]
    pub thread: Option<String>,

    /// Print tool calls as they happen
    #[arg(short, long)]
    pub verbose: bool,

    /// The user message
    pub message: String,
}

/// Arguments for the `history` subcommand.
#[derive(Parser, Debug)]
pub struct HistoryArgs {
    #[arg(short, long)]
    pub thread: String,

    /// Emit the raw JSON messages
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
