//! Conversation controller: turns user actions into message store updates
//! and gateway calls.

pub mod conversation;
pub mod exchange;

pub use conversation::{ControllerOptions, ConversationController, DEFAULT_REQUEST_TIMEOUT};
pub use exchange::Exchange;
