//! complai CLI entry point.
//!
//! Binary name: `complai`
//!
//! Parses CLI arguments, sets up tracing, wires the conversation runtime,
//! then dispatches to the chat loop or a one-shot command.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;

use complai_observe::LogFormat;
use complai_types::config::ThreadBootstrap;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions don't need tracing or app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "complai", &mut std::io::stdout());
        return Ok(());
    }

    let format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    complai_observe::init_tracing(cli::log_filter(cli.verbose, cli.quiet), format, cli.otel)
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    complai_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let bootstrap = match &cli.command {
        Commands::Chat { resume: true, .. } => Some(ThreadBootstrap::ReuseLatest),
        _ => None,
    };
    let state = AppState::init(cli.token.clone(), bootstrap).await?;

    match cli.command {
        Commands::Chat { mode, .. } => {
            cli::chat::loop_runner::run_chat_loop(&state, mode.as_deref()).await?;
        }
        Commands::Threads => {
            cli::threads::list_threads(&state, cli.json).await?;
        }
        Commands::Ask { query, mode } => {
            cli::ask::ask(&state, &query, mode.as_deref(), cli.json).await?;
        }
        Commands::Modes => {
            cli::modes::list_modes(&state, cli.json)?;
        }
        Commands::Completions { .. } => {}
    }

    Ok(())
}
