//! User DTO

use chatsync_core::user::{User, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDTO {
    #[serde(alias = "_id")]
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub profile_pic: Option<String>,
    /// Server-assigned recency marker; optional on the wire.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<UserDTO> for User {
    fn from(dto: UserDTO) -> Self {
        User {
            id: UserId::new(dto.id),
            full_name: dto.full_name,
            profile_pic: dto.profile_pic.filter(|url| !url.trim().is_empty()),
            updated_at: dto.updated_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        }
    }
}
