//! Client configuration loader.
//!
//! Reads `config.toml` from the data directory (`~/.complai/` by default)
//! and deserializes it into [`ClientConfig`]. Falls back to defaults when
//! the file is missing or malformed, then applies environment overrides.

use std::path::{Path, PathBuf};

use complai_types::config::ClientConfig;
use secrecy::SecretString;

pub const DATA_DIR_ENV: &str = "COMPLAI_DATA_DIR";
pub const BASE_URL_ENV: &str = "COMPLAI_BASE_URL";
pub const TOKEN_ENV: &str = "COMPLAI_TOKEN";

const CONFIG_FILE: &str = "config.toml";

/// Resolve the data directory.
///
/// Priority:
/// 1. `COMPLAI_DATA_DIR` environment variable
/// 2. `~/.complai`
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(|key| std::env::var(key).ok())
}

fn data_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".complai"),
        None => PathBuf::from(".complai"),
    }
}

/// Location of the config file inside a data directory.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Load client configuration from `{data_dir}/config.toml`.
///
/// - Missing file: [`ClientConfig::default()`].
/// - Unreadable or unparsable file: logs a warning and returns the default.
///
/// Environment overrides are applied in both cases.
pub async fn load_client_config(data_dir: &Path) -> ClientConfig {
    let config = read_config_file(data_dir).await;
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

async fn read_config_file(data_dir: &Path) -> ClientConfig {
    let config_path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ClientConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ClientConfig::default();
        }
    };

    match toml::from_str::<ClientConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ClientConfig::default()
        }
    }
}

/// Apply `COMPLAI_BASE_URL` on top of a loaded config.
pub fn apply_env_overrides(
    mut config: ClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ClientConfig {
    if let Some(base_url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
        tracing::debug!(base_url = %base_url, "Base URL overridden from environment");
        config.base_url = base_url.trim().to_string();
    }
    config
}

/// Read the backend auth token from `COMPLAI_TOKEN`.
///
/// An explicit value (e.g. from a CLI flag) wins over the environment.
pub fn resolve_token(explicit: Option<String>) -> Option<SecretString> {
    token_from(explicit, |key| std::env::var(key).ok())
}

fn token_from(
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<SecretString> {
    explicit
        .or_else(|| lookup(TOKEN_ENV))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
}
