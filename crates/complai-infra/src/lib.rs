//! Infrastructure layer for complai.
//!
//! Contains the implementations of the ports defined in `complai-core`:
//! the REST gateway to the compliance backend and the config loader.

pub mod config;
pub mod gateway;
