//! Configuration service implementation.
//!
//! Loads [`ClientConfig`] from `config.toml` and applies environment
//! overrides.
//!
//! Resolution order for the file: explicit path > `CHATSYNC_CONFIG` >
//! `<config_dir>/chatsync/config.toml`. A missing file yields defaults.
//! `CHATSYNC_API_URL` and `CHATSYNC_TOKEN` override the loaded values.

use std::env;
use std::path::{Path, PathBuf};

use chatsync_core::config::ClientConfig;
use chatsync_core::error::{Result, SyncError};

use crate::paths::ChatsyncPaths;

pub const ENV_CONFIG_PATH: &str = "CHATSYNC_CONFIG";
pub const ENV_API_URL: &str = "CHATSYNC_API_URL";
pub const ENV_TOKEN: &str = "CHATSYNC_TOKEN";

/// Resolves and loads the client configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigService {
    explicit_path: Option<PathBuf>,
}

impl ConfigService {
    pub fn new(explicit_path: Option<PathBuf>) -> Self {
        Self { explicit_path }
    }

    /// The file that `load` reads, if one can be determined.
    pub fn config_path(&self) -> Option<PathBuf> {
        self.explicit_path
            .clone()
            .or_else(|| env::var(ENV_CONFIG_PATH).ok().map(PathBuf::from))
            .or_else(|| ChatsyncPaths::config_file().ok())
    }

    /// Loads the file (or defaults), applies env overrides and validates.
    pub fn load(&self) -> Result<ClientConfig> {
        let mut config = match self.config_path() {
            Some(path) => Self::load_file(&path)?,
            None => {
                tracing::debug!("[ConfigService] No config path available, using defaults");
                ClientConfig::default()
            }
        };

        Self::apply_overrides(
            &mut config,
            env::var(ENV_API_URL).ok(),
            env::var(ENV_TOKEN).ok(),
        );
        config.validate()?;
        Ok(config)
    }

    /// Reads one TOML file. A missing file yields defaults.
    pub fn load_file(path: &Path) -> Result<ClientConfig> {
        if !path.exists() {
            tracing::debug!(
                "[ConfigService] {} not found, using defaults",
                path.display()
            );
            return Ok(ClientConfig::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: ClientConfig = toml::from_str(&content)?;
        tracing::info!("[ConfigService] Loaded configuration from {}", path.display());
        Ok(config)
    }

    fn apply_overrides(config: &mut ClientConfig, api_url: Option<String>, token: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            config.api_base_url = url;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            config.auth_token = Some(token);
        }
    }
}
