//! Slash command parsing for the chat loop.
//!
//! Commands start with `/` and give in-chat control over threads, the
//! retrieval mode, the system prompt, and resending.

use console::style;

use complai_types::mode::SystemPromptType;
use complai_types::thread::ThreadListView;

/// Available slash commands in the chat loop.
#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    Help,
    Clear,
    Exit,
    /// Start a fresh thread and make it current.
    New,
    /// Show the thread list.
    Threads,
    /// Make another thread current, by list number or id prefix.
    Switch(String),
    /// Retitle the current thread.
    Rename(String),
    /// Archive a thread (current when no argument).
    Archive(Option<String>),
    Unarchive(String),
    /// Delete a thread locally (current when no argument).
    Delete(Option<String>),
    /// Show or set the retrieval mode.
    Mode(Option<String>),
    Modes,
    /// Set the system prompt type, with custom prompt text for `custom`.
    Prompt {
        kind: SystemPromptType,
        custom: Option<String>,
    },
    /// Re-send the last user message.
    Reload,
    /// Send a corrected version of the last message.
    Edit(String),
    /// Show the current thread's messages.
    History,
    /// Malformed or unknown command, with a message for the user.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (cmd, arg) = match trimmed.split_once(' ') {
        Some((cmd, arg)) => (cmd.to_lowercase(), Some(arg.trim().to_string())),
        None => (trimmed.to_lowercase(), None),
    };
    let arg = arg.filter(|a| !a.is_empty());

    let command = match cmd.as_str() {
        "/help" | "/h" | "/?" => ChatCommand::Help,
        "/clear" | "/cls" => ChatCommand::Clear,
        "/exit" | "/quit" | "/q" => ChatCommand::Exit,
        "/new" => ChatCommand::New,
        "/threads" | "/ls" => ChatCommand::Threads,
        "/switch" | "/sw" => required(
            arg,
            "/switch requires a thread number or id",
            ChatCommand::Switch,
        ),
        "/rename" => required(arg, "/rename requires a title", ChatCommand::Rename),
        "/archive" => ChatCommand::Archive(arg),
        "/unarchive" => required(
            arg,
            "/unarchive requires a thread number or id",
            ChatCommand::Unarchive,
        ),
        "/delete" | "/rm" => ChatCommand::Delete(arg),
        "/mode" => ChatCommand::Mode(arg),
        "/modes" => ChatCommand::Modes,
        "/prompt" => parse_prompt(arg),
        "/reload" | "/retry" => ChatCommand::Reload,
        "/edit" => required(arg, "/edit requires the corrected message", ChatCommand::Edit),
        "/history" => ChatCommand::History,
        other => ChatCommand::Unknown(other.to_string()),
    };
    Some(command)
}

fn required(arg: Option<String>, usage: &str, build: fn(String) -> ChatCommand) -> ChatCommand {
    match arg {
        Some(arg) => build(arg),
        None => ChatCommand::Unknown(usage.to_string()),
    }
}

fn parse_prompt(arg: Option<String>) -> ChatCommand {
    let Some(arg) = arg else {
        return ChatCommand::Unknown(
            "/prompt requires chat, compliance, or custom <text>".to_string(),
        );
    };
    let (kind, rest) = match arg.split_once(' ') {
        Some((kind, rest)) => (kind, Some(rest.trim().to_string()).filter(|r| !r.is_empty())),
        None => (arg.as_str(), None),
    };
    match kind.parse::<SystemPromptType>() {
        Ok(SystemPromptType::Custom) if rest.is_none() => {
            ChatCommand::Unknown("/prompt custom requires the prompt text".to_string())
        }
        Ok(kind) => ChatCommand::Prompt { kind, custom: rest },
        Err(e) => ChatCommand::Unknown(e),
    }
}

/// Resolve a user-supplied thread reference against the thread list.
///
/// Numbers index the list as printed by `/threads` (regular threads first,
/// then archived) and never fall back to id matching. Anything else must be
/// an exact id or a unique id prefix.
pub fn resolve_thread(view: &ThreadListView, reference: &str) -> Option<String> {
    let all: Vec<_> = view.threads.iter().chain(view.archived_threads.iter()).collect();

    if let Ok(number) = reference.parse::<usize>() {
        return number
            .checked_sub(1)
            .and_then(|index| all.get(index))
            .map(|thread| thread.id.clone());
    }

    if let Some(exact) = all.iter().find(|t| t.id == reference) {
        return Some(exact.id.clone());
    }

    let mut matches = all.iter().filter(|t| t.id.starts_with(reference));
    match (matches.next(), matches.next()) {
        (Some(only), None) => Some(only.id.clone()),
        _ => None,
    }
}

/// Print the help text listing all available commands.
pub fn print_help() {
    let rows = [
        ("/help", "Show this help message"),
        ("/new", "Start a new thread"),
        ("/threads", "List threads (* marks the current one)"),
        ("/switch <n|id>", "Switch to another thread"),
        ("/rename <title>", "Rename the current thread"),
        ("/archive [n|id]", "Archive a thread"),
        ("/unarchive <n|id>", "Restore an archived thread"),
        ("/delete [n|id]", "Delete a thread from this session"),
        ("/mode [type/mode]", "Show or change the retrieval mode"),
        ("/modes", "List common retrieval modes"),
        ("/prompt <kind> [text]", "chat, compliance, or custom <text>"),
        ("/reload", "Ask the last question again"),
        ("/edit <text>", "Send a corrected version of your last message"),
        ("/history", "Show this thread's messages"),
        ("/clear", "Clear the screen"),
        ("/exit", "End the chat session"),
    ];

    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    for (command, description) in rows {
        println!("  {:<24} {}", style(command).cyan(), description);
    }
    println!();
    println!(
        "  {}",
        style("Ctrl+C cancels a pending reply, Ctrl+D exits").dim()
    );
    println!();
}
