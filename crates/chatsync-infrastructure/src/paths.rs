//! Path management for chatsync configuration files.
//!
//! ```text
//! ~/.config/chatsync/          # Config directory (platform config dir)
//! └── config.toml              # Client configuration
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Config directory could not be determined.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find config directory"),
        }
    }
}

impl std::error::Error for PathError {}

const APP_DIR: &str = "chatsync";
const CONFIG_FILE: &str = "config.toml";

pub struct ChatsyncPaths;

impl ChatsyncPaths {
    /// Returns the chatsync configuration directory (e.g. `~/.config/chatsync/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the default config file path.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Self::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }
}
