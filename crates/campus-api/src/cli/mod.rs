//! CLI command definitions for the `campus` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod history;
pub mod status;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Run and inspect the campus chat hub.
#[derive(Parser)]
#[command(name = "campus", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as newline-delimited JSON.
    #[arg(long, global = true, env = "CAMPUS_LOG_JSON")]
    pub log_json: bool,

    /// Also export spans to stdout via OpenTelemetry.
    #[arg(long, global = true, env = "CAMPUS_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the chat server (WebSocket + REST API).
    Serve {
        /// Port to listen on (overrides config.toml).
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config.toml).
        #[arg(long)]
        host: Option<String>,
    },

    /// Show stored chat history, newest first.
    History {
        /// Maximum messages to show.
        #[arg(short, long)]
        limit: Option<i64>,

        /// Number of messages to skip.
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Show configuration and storage status.
    Status,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
