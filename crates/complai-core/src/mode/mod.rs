//! Mode/config selection consumed by the controller on every send.
//!
//! The selector is injected into the controller instead of being read from
//! process-wide state, so tests can pin a mode deterministically.

pub mod selector;

pub use selector::{ModeSelector, SharedModeSelector};
