//! Conversation message types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Server-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MessageId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A message acknowledged by the server. Immutable once received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    /// Text body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image attachment URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(
        id: impl Into<MessageId>,
        sender_id: impl Into<UserId>,
        receiver_id: impl Into<UserId>,
        text: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            sender_id: sender_id.into(),
            receiver_id: receiver_id.into(),
            text: Some(text.into()),
            image: None,
            created_at,
        }
    }

    pub fn body(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Whether `user` is the sender or the receiver.
    pub fn involves(&self, user: &UserId) -> bool {
        &self.sender_id == user || &self.receiver_id == user
    }
}

/// Content submitted by the local user for sending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl MessageDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            image: None,
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    /// A draft with no text (after trimming) and no image has nothing to send.
    pub fn is_empty(&self) -> bool {
        let no_text = self.text.as_deref().is_none_or(|t| t.trim().is_empty());
        no_text && self.image.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involves_sender_and_receiver() {
        let msg = Message::new("m1", "a", "b", "hi", DateTime::<Utc>::UNIX_EPOCH);
        assert!(msg.involves(&UserId::new("a")));
        assert!(msg.involves(&UserId::new("b")));
        assert!(!msg.involves(&UserId::new("c")));
    }

    #[test]
    fn test_draft_emptiness() {
        assert!(MessageDraft::default().is_empty());
        assert!(MessageDraft::text("   ").is_empty());
        assert!(!MessageDraft::text("hi").is_empty());
        assert!(!MessageDraft::default().with_image("https://img/1.png").is_empty());
    }
}
