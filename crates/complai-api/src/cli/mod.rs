//! CLI command definitions and dispatch for the `complai` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod ask;
pub mod chat;
pub mod modes;
pub mod threads;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with the compliance assistant from your terminal.
#[derive(Parser)]
#[command(name = "complai", version, about, long_about = None)]
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

    /// Backend auth token (defaults to $COMPLAI_TOKEN).
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start an interactive chat session.
    Chat {
        /// Retrieval mode for this session, e.g. `lightrag/hybrid`.
        #[arg(long, short)]
        mode: Option<String>,

        /// Resume the most recent thread instead of starting a new one.
        #[arg(long)]
        resume: bool,
    },

    /// List your conversation threads.
    #[command(alias = "ls")]
    Threads,

    /// Ask a one-off compliance question outside any thread.
    Ask {
        /// The question to ask.
        query: String,

        /// Retrieval mode, e.g. `lightrag/naive`.
        #[arg(long, short)]
        mode: Option<String>,
    },

    /// List the available retrieval modes.
    Modes,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Default log filter for a verbosity level.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,complai_core=debug,complai_infra=debug",
        _ => "trace",
    }
}
