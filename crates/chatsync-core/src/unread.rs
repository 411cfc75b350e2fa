//! Per-counterparty queues of messages not yet viewed.

use std::collections::HashMap;

use crate::message::Message;
use crate::user::UserId;

/// Unread index keyed by counterparty.
///
/// A key exists only while its queue holds at least one message, so "has
/// unread" is a key lookup and cleared users leave nothing behind.
#[derive(Debug, Clone, Default)]
pub struct UnreadTracker {
    queues: HashMap<UserId, Vec<Message>>,
}

impl UnreadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `message` to `user_id`'s queue, creating it if absent.
    ///
    /// A redelivered message id already in the queue is ignored.
    pub fn enqueue(&mut self, user_id: &UserId, message: Message) {
        let queue = self.queues.entry(user_id.clone()).or_default();
        if queue.iter().any(|m| m.id == message.id) {
            tracing::debug!("[UnreadTracker] Ignoring redelivered message {}", message.id);
            return;
        }
        queue.push(message);
    }

    /// Drops `user_id`'s queue. Idempotent.
    pub fn clear(&mut self, user_id: &UserId) {
        self.queues.remove(user_id);
    }

    pub fn count_for(&self, user_id: &UserId) -> usize {
        self.queues.get(user_id).map_or(0, Vec::len)
    }

    pub fn has_unread(&self, user_id: &UserId) -> bool {
        self.queues.contains_key(user_id)
    }

    /// Queued messages for `user_id`, oldest first.
    pub fn messages_for(&self, user_id: &UserId) -> &[Message] {
        self.queues.get(user_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Unread count across every counterparty.
    pub fn total(&self) -> usize {
        self.queues.values().map(Vec::len).sum()
    }

    pub fn counts(&self) -> HashMap<UserId, usize> {
        self.queues
            .iter()
            .map(|(id, queue)| (id.clone(), queue.len()))
            .collect()
    }
}
