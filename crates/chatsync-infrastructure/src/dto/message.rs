//! Message DTOs

use chatsync_core::message::{Message, MessageDraft, MessageId};
use chatsync_core::user::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDTO {
    #[serde(alias = "_id")]
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<MessageDTO> for Message {
    fn from(dto: MessageDTO) -> Self {
        Message {
            id: MessageId::new(dto.id),
            sender_id: UserId::new(dto.sender_id),
            receiver_id: UserId::new(dto.receiver_id),
            text: dto.text,
            image: dto.image.filter(|url| !url.trim().is_empty()),
            created_at: dto.created_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}

/// Body of `POST /messages/send/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<&'a str>,
}

impl<'a> From<&'a MessageDraft> for SendMessageRequest<'a> {
    fn from(draft: &'a MessageDraft) -> Self {
        Self {
            text: draft.text.as_deref(),
            image: draft.image.as_deref(),
        }
    }
}
