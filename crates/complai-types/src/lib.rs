//! Shared domain types for the complai conversation runtime.
//!
//! Threads, messages, retrieval modes, client configuration, session events,
//! and the error taxonomy used across the workspace.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod event;
pub mod gateway;
pub mod message;
pub mod mode;
pub mod thread;
