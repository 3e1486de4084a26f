//! Interactive CLI chat experience for complai.
//!
//! Implements the chat loop on top of the conversation controller: welcome
//! banner, thinking spinner, cancellable sends, thread management through
//! slash commands. Entry point: `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
pub mod renderer;
