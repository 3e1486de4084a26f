//! Per-thread message storage.
//!
//! The store maps a thread id to that thread's ordered message sequence.
//! Writes always replace a whole sequence; see [`MessageStore::update`] for
//! the apply-against-latest form used by concurrent sends.

pub mod message_store;

pub use message_store::MessageStore;
