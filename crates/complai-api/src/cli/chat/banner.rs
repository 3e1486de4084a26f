//! Welcome banner display for chat sessions.

use std::path::Path;

use console::style;

use complai_core::registry::InitSummary;

/// Print the welcome banner at the start of a chat session.
///
/// Shows the backend, config file, retrieval mode and current thread, and
/// warns when some thread history could not be loaded.
pub fn print_welcome_banner(
    base_url: &str,
    config_path: &Path,
    mode: &str,
    summary: &InitSummary,
) {
    println!();
    println!("  {} {}", "§", style("complai").cyan().bold());
    println!("  {}", style("Compliance assistant").dim());
    println!();
    println!("  {}  {}", style("Backend:").bold(), style(base_url).dim());
    println!(
        "  {}   {}",
        style("Config:").bold(),
        style(config_path.display()).dim()
    );
    println!("  {}     {}", style("Mode:").bold(), style(mode).dim());
    println!(
        "  {}   {}",
        style("Thread:").bold(),
        style(short_id(&summary.current_thread_id)).dim()
    );
    if summary.threads_listed > 0 {
        println!(
            "  {}  {}",
            style("History:").bold(),
            style(format!("{} threads", summary.threads_listed)).dim()
        );
    }
    if !summary.histories_failed.is_empty() {
        println!(
            "  {} {} thread(s) could not be loaded and will show as empty",
            style("!").yellow().bold(),
            summary.histories_failed.len()
        );
    }
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}

/// First 8 characters of an id, for display.
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}
