//! Thread catalogue and current-thread selection.

pub mod thread_registry;

pub use thread_registry::{InitSummary, ThreadRegistry};
