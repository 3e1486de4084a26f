//! Conversation session runtime for complai.
//!
//! - `gateway`: the `ConversationGateway` port to the backend
//! - `store`: per-thread message sequences
//! - `registry`: thread catalogue and current thread
//! - `mode`: retrieval mode and prompt selection
//! - `controller`: send/edit/reload/cancel state machine on top of the rest
//! - `event`: change notifications for rendering surfaces

pub mod controller;
pub mod event;
pub mod gateway;
pub mod mode;
pub mod registry;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
