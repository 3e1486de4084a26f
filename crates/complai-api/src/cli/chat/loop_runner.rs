//! Main chat loop orchestration.
//!
//! Initializes the thread registry, prints the banner, then reads lines:
//! slash commands are dispatched locally, anything else is sent to the
//! current thread. While a reply is pending, Ctrl+C cancels it.

use std::future::Future;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use complai_core::controller::Exchange;
use complai_core::mode::ModeSelector;
use complai_types::error::ConversationError;
use complai_types::message::{AppendMessage, MessageRole};
use complai_types::mode::SystemPromptType;
use complai_types::thread::DEFAULT_THREAD_ID;

use crate::state::{AppState, ConcreteController};

use super::banner::{print_welcome_banner, short_id};
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};
use super::renderer;

/// What the loop should do after handling a command.
enum Flow {
    Continue,
    Exit,
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking... (Ctrl+C to cancel)");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn prompt_for(controller: &ConcreteController) -> String {
    let current = controller.current_thread_id();
    let title = controller
        .registry()
        .thread(&current)
        .map(|t| t.title)
        .unwrap_or_else(|| short_id(&current).to_string());
    format!("  {} {} ", style(title).dim(), style("You >").green().bold())
}

fn notice(symbol: &str, message: impl std::fmt::Display) {
    println!("\n  {} {message}\n", style(symbol).yellow().bold());
}

/// Drive a send to completion, cancelling it if the user interrupts.
///
/// Lines typed while the reply is pending are not sent.
async fn await_reply(
    controller: &ConcreteController,
    input: &mut ChatInput,
    send: impl Future<Output = Result<Exchange, ConversationError>>,
) -> Result<Exchange, ConversationError> {
    let spinner = thinking_spinner();
    tokio::pin!(send);
    let result = loop {
        tokio::select! {
            result = &mut send => break result,
            event = input.read_line() => match event {
                InputEvent::Interrupted | InputEvent::Eof => {
                    let cancelled = controller.on_cancel();
                    debug!(cancelled, "Interrupted pending reply");
                }
                InputEvent::Message(_) => {
                    spinner.println("  still waiting for the previous reply, Ctrl+C to cancel");
                }
            },
        }
    };
    spinner.finish_and_clear();
    result
}

async fn send(
    state: &AppState,
    input: &mut ChatInput,
    pending: impl Future<Output = Result<Exchange, ConversationError>>,
) {
    let controller = &state.controller;
    match await_reply(controller, input, pending).await {
        Ok(exchange) => {
            renderer::print_exchange(&exchange, &state.modes.retrieval_mode().to_string());
        }
        Err(e) => notice("!", e),
    }
}

fn resolve_or_current(state: &AppState, reference: Option<String>) -> Option<String> {
    let controller = &state.controller;
    match reference {
        None => Some(controller.current_thread_id()),
        Some(reference) => {
            let resolved = commands::resolve_thread(&controller.thread_list(), &reference);
            if resolved.is_none() {
                notice("?", format!("No thread matches '{reference}'. Try /threads."));
            }
            resolved
        }
    }
}

fn report(result: Result<(), ConversationError>, done: &str) {
    match result {
        Ok(()) => println!("\n  {} {done}\n", style("*").cyan().bold()),
        Err(e) => notice("!", e),
    }
}

async fn handle_command(state: &AppState, input: &mut ChatInput, command: ChatCommand) -> Flow {
    let controller = &state.controller;
    match command {
        ChatCommand::Help => commands::print_help(),
        ChatCommand::Clear => input.clear(),
        ChatCommand::Exit => return Flow::Exit,
        ChatCommand::New => match controller.switch_to_new().await {
            Ok(thread_id) => println!(
                "\n  {} Started thread {}\n",
                style("*").cyan().bold(),
                style(short_id(&thread_id)).dim()
            ),
            Err(e) => notice("!", format!("Could not create a thread: {e}")),
        },
        ChatCommand::Threads => renderer::print_thread_list(&controller.thread_list()),
        ChatCommand::Switch(reference) => {
            if let Some(thread_id) = resolve_or_current(state, Some(reference)) {
                if controller.switch_to(&thread_id) {
                    renderer::print_history(&controller.messages());
                }
            }
        }
        ChatCommand::Rename(title) => {
            let current = controller.current_thread_id();
            report(controller.rename(&current, &title), "Thread renamed.");
        }
        ChatCommand::Archive(reference) => {
            if let Some(thread_id) = resolve_or_current(state, reference) {
                report(controller.archive(&thread_id), "Thread archived.");
            }
        }
        ChatCommand::Unarchive(reference) => {
            if let Some(thread_id) = resolve_or_current(state, Some(reference)) {
                report(controller.unarchive(&thread_id), "Thread restored.");
            }
        }
        ChatCommand::Delete(reference) => {
            if let Some(thread_id) = resolve_or_current(state, reference) {
                report(controller.delete(&thread_id), "Thread deleted from this session.");
                if controller.current_thread_id() == DEFAULT_THREAD_ID {
                    println!(
                        "  {}\n",
                        style("No thread selected. /new starts one, /switch picks one.").dim()
                    );
                }
            }
        }
        ChatCommand::Mode(None) => println!(
            "\n  {} {}\n",
            style("Mode:").bold(),
            state.modes.retrieval_mode()
        ),
        ChatCommand::Mode(Some(value)) => match state.modes.select(&value) {
            Ok(mode) => println!("\n  {} Mode set to {}\n", style("*").cyan().bold(), mode),
            Err(e) => notice("!", e),
        },
        ChatCommand::Modes => {
            if let Err(e) = crate::cli::modes::list_modes(state, false) {
                notice("!", e);
            }
        }
        ChatCommand::Prompt { kind, custom } => {
            state.modes.set_system_prompt_type(kind);
            if let Some(custom) = custom {
                state.modes.set_custom_prompt(custom);
            }
            let label = match kind {
                SystemPromptType::Custom => "custom prompt",
                SystemPromptType::Compliance => "compliance prompt",
                SystemPromptType::Chat => "no system prompt",
            };
            println!("\n  {} Using {label}\n", style("*").cyan().bold());
        }
        ChatCommand::Reload => send(state, input, controller.reload_last()).await,
        ChatCommand::Edit(text) => {
            let parent_id = controller
                .messages()
                .into_iter()
                .rev()
                .find(|m| m.role == MessageRole::User)
                .map(|m| m.id);
            let message = AppendMessage {
                parent_id,
                ..AppendMessage::text(text)
            };
            send(state, input, controller.on_edit(message)).await;
        }
        ChatCommand::History => renderer::print_history(&controller.messages()),
        ChatCommand::Unknown(detail) => notice(
            "?",
            format!(
                "{}. Type /help for available commands.",
                style(detail).dim()
            ),
        ),
    }
    Flow::Continue
}

/// Run the interactive chat loop.
pub async fn run_chat_loop(state: &AppState, mode: Option<&str>) -> anyhow::Result<()> {
    if let Some(mode) = mode {
        state.modes.select(mode)?;
    }
    let controller = &state.controller;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("loading threads...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    let summary = controller.initialize().await;
    spinner.finish_and_clear();

    print_welcome_banner(
        &state.config.base_url,
        &state.config_path(),
        &state.modes.retrieval_mode().to_string(),
        &summary,
    );
    if summary.created_thread_id.is_none() {
        renderer::print_history(&controller.messages());
    }

    let (mut input, _writer) = ChatInput::new(prompt_for(controller))
        .map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        input.update_prompt(&prompt_for(controller));
        match input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
            }
            InputEvent::Message(text) if text.is_empty() => {}
            InputEvent::Message(text) => {
                if let Some(command) = commands::parse(&text) {
                    if let Flow::Exit = handle_command(state, &mut input, command).await {
                        break;
                    }
                    continue;
                }
                send(state, &mut input, controller.on_new(AppendMessage::text(text))).await;
            }
        }
    }

    let cancelled = controller.cancel_all();
    if cancelled > 0 {
        info!(cancelled, "Cancelled pending replies on exit");
    }
    input.flush();
    println!("\n  {}", style("Session ended.").dim());
    Ok(())
}
