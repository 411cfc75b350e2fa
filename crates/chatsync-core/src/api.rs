//! HTTP contract consumed by the store.

use async_trait::async_trait;

use crate::error::Result;
use crate::message::{Message, MessageDraft};
use crate::user::{User, UserId};

/// Request/response contract of the chat backend.
///
/// Implementations report network failures as `SyncError::Transport` and
/// structured peer errors as `SyncError::Server`.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Fetches the contact directory. Missing recency markers come back as epoch.
    async fn fetch_directory(&self) -> Result<Vec<User>>;

    /// Fetches the conversation with `counterpart`, oldest first.
    async fn fetch_history(&self, counterpart: &UserId) -> Result<Vec<Message>>;

    /// Sends `draft` to `counterpart` and returns the server-created message.
    async fn send_message(&self, counterpart: &UserId, draft: &MessageDraft) -> Result<Message>;
}
