//! Client configuration types.
//!
//! `ClientConfig` represents `config.toml` in the data directory. Every field
//! has a default, so an empty file (or no file at all) is a valid config.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::mode::{PromptConfig, RetrievalMode, SystemPromptType};

/// How the thread registry picks the current thread at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadBootstrap {
    /// Create a fresh thread on every start, concurrently with listing.
    AlwaysCreate,
    /// Resume the most recently updated listed thread; create only if none.
    ReuseLatest,
}

impl Default for ThreadBootstrap {
    fn default() -> Self {
        ThreadBootstrap::AlwaysCreate
    }
}

impl fmt::Display for ThreadBootstrap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ThreadBootstrap::AlwaysCreate => write!(f, "always_create"),
            ThreadBootstrap::ReuseLatest => write!(f, "reuse_latest"),
        }
    }
}

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Root URL of the compliance backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Upper bound for a single backend round trip.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Scheme prefix for the `Authorization` header.
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    #[serde(default)]
    pub bootstrap: ThreadBootstrap,

    #[serde(default)]
    pub default_mode: RetrievalMode,

    #[serde(default)]
    pub system_prompt_type: SystemPromptType,

    #[serde(default)]
    pub custom_prompt: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

fn default_auth_scheme() -> String {
    "Token".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            auth_scheme: default_auth_scheme(),
            bootstrap: ThreadBootstrap::default(),
            default_mode: RetrievalMode::default(),
            system_prompt_type: SystemPromptType::default(),
            custom_prompt: String::new(),
        }
    }
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The prompt configuration a fresh session starts with.
    pub fn prompt_config(&self) -> PromptConfig {
        PromptConfig {
            system_prompt_type: self.system_prompt_type,
            custom_prompt: self.custom_prompt.clone(),
        }
    }
}
