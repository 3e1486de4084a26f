//! Change notifications published by the session runtime.
//!
//! The rendering surface subscribes to these to know when to re-read the
//! registry or the message store. Events carry ids only, never state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The catalogue changed (added, renamed, archived, deleted).
    ThreadsChanged,
    /// A different thread became current.
    CurrentThreadChanged { thread_id: String },
    /// The message sequence of a thread was replaced.
    MessagesChanged { thread_id: String },
}
