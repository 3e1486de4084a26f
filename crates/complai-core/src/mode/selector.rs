//! Mode selector: the retrieval mode and system prompt for the next send.
//!
//! `SharedModeSelector` holds both behind one lock so the chat surface can
//! change them between sends while the controller reads a consistent pair.

use std::sync::{Arc, RwLock};

use complai_types::config::ClientConfig;
use complai_types::error::ModeParseError;
use complai_types::mode::{PromptConfig, RetrievalMode, SystemPromptType};
use tracing::debug;

/// Supplies the retrieval mode and prompt configuration for the next send.
pub trait ModeSelector: Send + Sync {
    fn retrieval_mode(&self) -> RetrievalMode;

    fn prompt_config(&self) -> PromptConfig;
}

impl<T: ModeSelector + ?Sized> ModeSelector for Arc<T> {
    fn retrieval_mode(&self) -> RetrievalMode {
        (**self).retrieval_mode()
    }

    fn prompt_config(&self) -> PromptConfig {
        (**self).prompt_config()
    }
}

/// Mutable selector shared between the controller and the surface that
/// lets the user pick a mode.
#[derive(Debug, Default)]
pub struct SharedModeSelector {
    mode: RwLock<RetrievalMode>,
    prompt: RwLock<PromptConfig>,
}

impl SharedModeSelector {
    pub fn new(mode: RetrievalMode, prompt: PromptConfig) -> Self {
        Self {
            mode: RwLock::new(mode),
            prompt: RwLock::new(prompt),
        }
    }

    /// Start from the configured default mode and prompt.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.default_mode.clone(), config.prompt_config())
    }

    pub fn set_mode(&self, mode: RetrievalMode) {
        debug!(mode = %mode, "Retrieval mode changed");
        *self.mode.write().expect("mode selector lock poisoned") = mode;
    }

    /// Parse and select a `"<type>/<mode>"` value.
    pub fn select(&self, value: &str) -> Result<RetrievalMode, ModeParseError> {
        let mode: RetrievalMode = value.parse()?;
        self.set_mode(mode.clone());
        Ok(mode)
    }

    pub fn set_system_prompt_type(&self, system_prompt_type: SystemPromptType) {
        self.prompt
            .write()
            .expect("mode selector lock poisoned")
            .system_prompt_type = system_prompt_type;
    }

    pub fn set_custom_prompt(&self, custom_prompt: impl Into<String>) {
        self.prompt
            .write()
            .expect("mode selector lock poisoned")
            .custom_prompt = custom_prompt.into();
    }
}

impl ModeSelector for SharedModeSelector {
    fn retrieval_mode(&self) -> RetrievalMode {
        self.mode.read().expect("mode selector lock poisoned").clone()
    }

    fn prompt_config(&self) -> PromptConfig {
        self.prompt.read().expect("mode selector lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selector_uses_lightrag_naive() {
        let selector = SharedModeSelector::default();
        assert_eq!(selector.retrieval_mode().to_string(), "lightrag/naive");
        assert_eq!(selector.prompt_config(), PromptConfig::default());
    }

    #[test]
    fn select_parses_and_stores() {
        let selector = SharedModeSelector::default();
        let mode = selector.select("rag/openai/gpt-4.1").unwrap();
        assert_eq!(mode.retrieval_type, "rag");
        assert_eq!(selector.retrieval_mode(), mode);
    }

    #[test]
    fn select_rejects_malformed_and_keeps_previous() {
        let selector = SharedModeSelector::default();
        assert!(selector.select("hybrid").is_err());
        assert_eq!(selector.retrieval_mode().to_string(), "lightrag/naive");
    }

    #[test]
    fn prompt_setters() {
        let selector = SharedModeSelector::default();
        selector.set_system_prompt_type(SystemPromptType::Custom);
        selector.set_custom_prompt("Cite article numbers.");
        let prompt = selector.prompt_config();
        assert_eq!(prompt.system_prompt_type, SystemPromptType::Custom);
        assert_eq!(prompt.custom_prompt, "Cite article numbers.");
    }

    #[test]
    fn arc_selector_delegates() {
        let selector = Arc::new(SharedModeSelector::default());
        selector.set_mode(RetrievalMode::new("lightrag", "hybrid"));
        let shared: Arc<SharedModeSelector> = Arc::clone(&selector);
        assert_eq!(ModeSelector::retrieval_mode(&shared).retrieval_mode, "hybrid");
    }

    #[test]
    fn from_config_copies_defaults() {
        let config = ClientConfig {
            default_mode: RetrievalMode::new("lightrag", "global"),
            system_prompt_type: SystemPromptType::Compliance,
            ..ClientConfig::default()
        };
        let selector = SharedModeSelector::from_config(&config);
        assert_eq!(selector.retrieval_mode().retrieval_mode, "global");
        assert_eq!(
            selector.prompt_config().system_prompt_type,
            SystemPromptType::Compliance
        );
    }
}
