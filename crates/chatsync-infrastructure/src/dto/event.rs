//! Realtime frame DTO

use chatsync_core::error::Result;
use chatsync_core::realtime::{NEW_MESSAGE_EVENT, RealtimeEvent};
use serde::Deserialize;

use super::MessageDTO;

/// One JSON frame pushed by the realtime connection: `{"event": ..., "data": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RealtimeFrame {
    pub event: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Parses a raw frame. Events other than `newMessage` yield `Ok(None)`.
pub fn parse_frame(raw: &str) -> Result<Option<RealtimeEvent>> {
    let frame: RealtimeFrame = serde_json::from_str(raw)?;
    if frame.event != NEW_MESSAGE_EVENT {
        return Ok(None);
    }
    let dto: MessageDTO = serde_json::from_value(frame.data)?;
    Ok(Some(RealtimeEvent::NewMessage(dto.into())))
}
