//! Realtime push-event contract.

use futures::stream::BoxStream;

use crate::message::Message;

/// Wire name of the only inbound event.
pub const NEW_MESSAGE_EVENT: &str = "newMessage";

/// Parsed inbound event from the realtime channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RealtimeEvent {
    NewMessage(Message),
}

/// Source of realtime events for one authenticated connection.
///
/// Each call to `open` starts an independent stream; dropping the stream
/// detaches from the connection. The connection itself is owned elsewhere.
pub trait RealtimeChannel: Send + Sync {
    fn open(&self) -> BoxStream<'static, RealtimeEvent>;
}
