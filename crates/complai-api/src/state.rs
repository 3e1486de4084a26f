//! Application state wiring config, gateway, mode selector, and controller.
//!
//! The controller is generic over its gateway and mode selector; AppState
//! pins them to the boxed HTTP gateway and a shared selector.

use std::path::PathBuf;
use std::sync::Arc;

use complai_core::controller::ConversationController;
use complai_core::gateway::BoxConversationGateway;
use complai_core::mode::SharedModeSelector;
use complai_infra::config::{config_path, load_client_config, resolve_data_dir, resolve_token};
use complai_infra::gateway::HttpConversationGateway;
use complai_types::config::{ClientConfig, ThreadBootstrap};

/// Controller pinned to the concrete infra implementations.
pub type ConcreteController =
    ConversationController<BoxConversationGateway, Arc<SharedModeSelector>>;

/// Shared application state used by every command.
#[derive(Clone)]
pub struct AppState {
    pub config: ClientConfig,
    pub data_dir: PathBuf,
    pub modes: Arc<SharedModeSelector>,
    pub controller: Arc<ConcreteController>,
}

impl AppState {
    /// Load config and wire the runtime. Does not touch the network.
    ///
    /// `bootstrap` overrides the configured thread bootstrap policy.
    pub async fn init(
        token: Option<String>,
        bootstrap: Option<ThreadBootstrap>,
    ) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let mut config = load_client_config(&data_dir).await;
        if let Some(bootstrap) = bootstrap {
            config.bootstrap = bootstrap;
        }
        Self::from_config(config, data_dir, token)
    }

    pub fn from_config(
        config: ClientConfig,
        data_dir: PathBuf,
        token: Option<String>,
    ) -> anyhow::Result<Self> {
        let token = resolve_token(token);
        if token.is_none() {
            tracing::warn!("No auth token configured; set COMPLAI_TOKEN or pass --token");
        }

        let http = HttpConversationGateway::from_config(&config, token)?;
        tracing::debug!(base_url = %http.base_url(), "Using compliance backend");
        let gateway = Arc::new(BoxConversationGateway::new(http));

        let modes = Arc::new(SharedModeSelector::from_config(&config));
        let controller = Arc::new(ConversationController::from_config(
            gateway,
            Arc::clone(&modes),
            &config,
        ));

        Ok(Self {
            config,
            data_dir,
            modes,
            controller,
        })
    }

    /// Where this session's `config.toml` is read from.
    pub fn config_path(&self) -> PathBuf {
        config_path(&self.data_dir)
    }
}
