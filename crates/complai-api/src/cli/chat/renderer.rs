//! Terminal rendering of replies, thread history, and the thread list.
//!
//! Replies are indented and wrapped in `console` styling. Assistant replies
//! that did not complete normally are marked so the user can `/reload`.

use console::style;

use complai_core::controller::Exchange;
use complai_types::message::{CompletionReason, Message, MessageRole};
use complai_types::thread::{Thread, ThreadListView};

use super::banner::short_id;

/// Indent every line of `text` by two spaces.
pub fn indent(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Print the assistant side of a finished exchange with its footer.
pub fn print_exchange(exchange: &Exchange, mode: &str) {
    println!();
    println!("  {}", style("complai").cyan().bold());
    println!("{}", indent(&exchange.assistant.text()));

    match exchange.reason() {
        Some(CompletionReason::Stop) => print_stats_footer(exchange, mode),
        Some(CompletionReason::Cancelled) => {
            println!("  {}", style("(cancelled, /reload to ask again)").yellow().dim());
        }
        Some(CompletionReason::Timeout) => {
            println!("  {}", style("(timed out, /reload to ask again)").yellow().dim());
        }
        Some(CompletionReason::Error) | None => {
            println!("  {}", style("(request failed, /reload to retry)").red().dim());
        }
    }
    println!();
}

/// Footer format: "| {backend}s . {roundtrip}s . {mode}"
fn print_stats_footer(exchange: &Exchange, mode: &str) {
    let roundtrip = exchange.elapsed.as_secs_f64();
    let backend = match exchange.timing_ms {
        Some(ms) => format!("{:.1}s backend {} ", ms as f64 / 1000.0, style("\u{00b7}").dim()),
        None => String::new(),
    };
    println!(
        "\n  {} {}{:.1}s {} {}",
        style("|").dim(),
        style(backend).dim(),
        style(roundtrip).dim(),
        style("\u{00b7}").dim(),
        style(mode).dim(),
    );
}

/// Print a thread's messages, oldest first.
pub fn print_history(messages: &[Message]) {
    println!();
    if messages.is_empty() {
        println!("  {}", style("No messages in this thread yet.").dim());
        println!();
        return;
    }
    for message in messages {
        let label = match message.role {
            MessageRole::User => style("You").green().bold(),
            MessageRole::Assistant => style("complai").cyan().bold(),
        };
        let text = message.text();
        let preview = if text.chars().count() > 200 {
            format!("{}...", text.chars().take(197).collect::<String>())
        } else {
            text
        };
        let pending = if message.status.is_running() {
            format!(" {}", style("(waiting)").dim())
        } else {
            String::new()
        };
        println!("  {label}{pending} {preview}");
    }
    println!();
}

fn print_thread_row(number: usize, thread: &Thread, current: &str) {
    let marker = if thread.id == current {
        style("*").green().bold()
    } else {
        style(" ")
    };
    println!(
        "  {marker} {:>2}. {}  {}",
        number,
        thread.title,
        style(short_id(&thread.id)).dim()
    );
}

/// Print both partitions, numbered consecutively for `/switch <n>`.
pub fn print_thread_list(view: &ThreadListView) {
    println!();
    if view.total() == 0 {
        println!("  {}", style("No threads.").dim());
        println!();
        return;
    }
    for (index, thread) in view.threads.iter().enumerate() {
        print_thread_row(index + 1, thread, &view.current_thread_id);
    }
    if !view.archived_threads.is_empty() {
        println!();
        println!("  {}", style("Archived").dim().bold());
        let offset = view.threads.len();
        for (index, thread) in view.archived_threads.iter().enumerate() {
            print_thread_row(offset + index + 1, thread, &view.current_thread_id);
        }
    }
    println!();
}
