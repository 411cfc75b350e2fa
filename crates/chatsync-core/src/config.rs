//! Client configuration model.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5001/api";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_FALLBACK_NOTIFICATION: &str = "Something went wrong";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Root configuration, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the chat HTTP API (without trailing slash).
    pub api_base_url: String,
    /// Bearer token for the authenticated session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Notification text for failures without a server-supplied message.
    pub fallback_notification: String,
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            auth_token: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            fallback_notification: DEFAULT_FALLBACK_NOTIFICATION.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ClientConfig {
    /// Checks values that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(SyncError::config("api_base_url must not be empty"));
        }
        if self.request_timeout_secs == 0 {
            return Err(SyncError::config("request_timeout_secs must be positive"));
        }
        Ok(())
    }
}
