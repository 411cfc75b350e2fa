//! Immutable views published by the store.

use std::collections::HashMap;

use chatsync_core::conversation::ConversationPhase;
use chatsync_core::directory::DirectoryPhase;
use chatsync_core::message::Message;
use chatsync_core::user::{User, UserId};
use serde::Serialize;

/// One directory row as the sidebar renders it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
    pub user: User,
    pub online: bool,
    pub unread_count: usize,
    pub selected: bool,
}

/// Point-in-time copy of the whole store state.
///
/// `contacts` is already filtered by the online-only toggle and keeps the
/// directory's recency order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub contacts: Vec<ContactView>,
    pub directory_phase: DirectoryPhase,
    pub selected: Option<User>,
    pub conversation_phase: ConversationPhase,
    pub transcript: Vec<Message>,
    pub unread: HashMap<UserId, usize>,
    pub total_unread: usize,
    /// Online users other than the signed-in one.
    pub online_count: usize,
    pub online_only: bool,
    pub subscribed: bool,
}

impl StoreSnapshot {
    pub fn contact(&self, user_id: &UserId) -> Option<&ContactView> {
        self.contacts.iter().find(|c| &c.user.id == user_id)
    }

    /// Zero-based position of `user_id` among the visible contacts.
    pub fn rank_of(&self, user_id: &UserId) -> Option<usize> {
        self.contacts.iter().position(|c| &c.user.id == user_id)
    }

    pub fn unread_for(&self, user_id: &UserId) -> usize {
        self.unread.get(user_id).copied().unwrap_or(0)
    }

    pub fn selected_id(&self) -> Option<&UserId> {
        self.selected.as_ref().map(|u| &u.id)
    }

    pub fn is_loading(&self) -> bool {
        self.directory_phase.is_loading()
            || self.conversation_phase == ConversationPhase::LoadingHistory
    }
}

/// Which command produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationSource {
    Directory,
    History,
    Send,
}

/// User-facing message for an absorbed command failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub source: NotificationSource,
    pub text: String,
}
