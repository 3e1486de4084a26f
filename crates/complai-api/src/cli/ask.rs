//! `complai ask`: one-off compliance query outside any thread.

use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::state::AppState;

pub async fn ask(state: &AppState, query: &str, mode: Option<&str>, json: bool) -> Result<()> {
    if let Some(mode) = mode {
        state
            .modes
            .select(mode)
            .with_context(|| format!("Invalid mode '{mode}'"))?;
    }

    let spinner = ProgressBar::new_spinner();
    if !json {
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("querying...");
        spinner.enable_steady_tick(Duration::from_millis(80));
    }

    let result = state.controller.ask(query).await;
    spinner.finish_and_clear();
    let reply = result?;

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    println!();
    println!("  {}", reply.text.trim());
    if let Some(ms) = reply.timing_ms {
        println!();
        println!("  {}", style(format!("answered in {:.2}s", ms as f64 / 1000.0)).dim());
    }
    println!();
    Ok(())
}
