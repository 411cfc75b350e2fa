//! Wire DTOs for the chat HTTP API and realtime channel.
//!
//! DTOs are tolerant of what the server omits; conversion into the domain
//! model fills in the invariants (epoch recency, no blank picture URLs).

mod event;
mod message;
mod user;

pub use event::{RealtimeFrame, parse_frame};
pub use message::{MessageDTO, SendMessageRequest};
pub use user::UserDTO;

use serde::Deserialize;

/// Error body returned by the server on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
