//! Error types for the chat synchronization store.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every chatsync crate.
///
/// The first three variants are the taxonomy the store reasons about at its
/// command boundary. `Config` and `Serialization` only occur outside that
/// boundary (bootstrap, file loading).
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncError {
    /// Network or connectivity failure with no structured peer message
    #[error("Transport error: {0}")]
    Transport(String),

    /// Structured error reported by the server
    #[error("Server error: {message}")]
    Server {
        status: Option<u16>,
        message: String,
    },

    /// Precondition violation by the caller (integration bug, never absorbed)
    #[error("Logic error: {0}")]
    Logic(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },
}

impl SyncError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a Server error
    pub fn server(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    /// Creates a Logic error
    pub fn logic(message: impl Into<String>) -> Self {
        Self::Logic(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Logic error
    pub fn is_logic(&self) -> bool {
        matches!(self, Self::Logic(_))
    }

    /// Check if this is a Server error
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Server { .. })
    }

    /// Check if this error is absorbed at the store boundary.
    ///
    /// Transport and server failures become user-facing notifications; every
    /// other variant indicates a bug or a bootstrap problem.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Server { .. })
    }

    /// Text shown to the user when this error is absorbed.
    ///
    /// Only server errors carry a peer-supplied message; everything else maps
    /// to `fallback`.
    pub fn notification_text(&self, fallback: &str) -> String {
        match self {
            Self::Server { message, .. } if !message.trim().is_empty() => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Config(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, SyncError>`.
pub type Result<T> = std::result::Result<T, SyncError>;
