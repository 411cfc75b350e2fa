//! Domain layer for chatsync.
//!
//! Entity model, the leaf components of the synchronization store, and the
//! contracts of its external collaborators. Nothing here performs I/O.

pub mod api;
pub mod clock;
pub mod config;
pub mod conversation;
pub mod directory;
pub mod error;
pub mod message;
pub mod realtime;
pub mod unread;
pub mod user;

// Re-export common error type
pub use error::{Result, SyncError};
