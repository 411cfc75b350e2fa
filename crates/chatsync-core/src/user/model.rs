//! User domain model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A chat counterparty as shown in the directory.
///
/// `updated_at` is a recency marker: the last activity involving this user
/// from this client's point of view. It is always defined; records that
/// arrive without one start at the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a user with no profile picture and an epoch recency marker.
    pub fn new(id: impl Into<UserId>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            profile_pic: None,
            updated_at: DateTime::<Utc>::UNIX_EPOCH,
        }
    }

    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = updated_at;
        self
    }

    pub fn with_profile_pic(mut self, url: impl Into<String>) -> Self {
        self.profile_pic = Some(url.into());
        self
    }
}
