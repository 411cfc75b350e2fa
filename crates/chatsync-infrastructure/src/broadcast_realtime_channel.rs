//! In-process realtime channel fed with raw JSON frames.
//!
//! The transport that owns the socket (or a test, or the CLI reading stdin)
//! publishes each received frame; every opened stream parses and yields the
//! `newMessage` events independently.

use std::sync::{Arc, PoisonError, RwLock};

use chatsync_core::realtime::{RealtimeChannel, RealtimeEvent};
use futures::StreamExt;
use futures::stream::{self, BoxStream};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::dto::parse_frame;

const DEFAULT_CAPACITY: usize = 256;

/// Fan-out of raw realtime frames.
///
/// Clones share one feed. After [`close`](Self::close), open streams still
/// yield every frame published before it and then end.
#[derive(Debug, Clone)]
pub struct BroadcastRealtimeChannel {
    sender: Arc<RwLock<Option<broadcast::Sender<String>>>>,
}

impl Default for BroadcastRealtimeChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl BroadcastRealtimeChannel {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(RwLock::new(Some(sender))),
        }
    }

    /// Publishes one raw frame. Returns the number of open streams that will
    /// see it; zero once closed.
    pub fn publish(&self, frame: impl Into<String>) -> usize {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        match sender.as_ref() {
            Some(sender) => sender.send(frame.into()).unwrap_or(0),
            None => 0,
        }
    }

    /// Stops the feed. Idempotent.
    pub fn close(&self) {
        let closed = self
            .sender
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if closed.is_some() {
            tracing::debug!("[RealtimeChannel] Feed closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.sender
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    pub fn subscriber_count(&self) -> usize {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        sender.as_ref().map_or(0, broadcast::Sender::receiver_count)
    }
}

impl RealtimeChannel for BroadcastRealtimeChannel {
    fn open(&self) -> BoxStream<'static, RealtimeEvent> {
        let sender = self.sender.read().unwrap_or_else(PoisonError::into_inner);
        let Some(receiver) = sender.as_ref().map(broadcast::Sender::subscribe) else {
            return stream::empty().boxed();
        };
        stream::unfold(receiver, |mut receiver| async move {
            loop {
                match receiver.recv().await {
                    Ok(raw) => match parse_frame(&raw) {
                        Ok(Some(event)) => return Some((event, receiver)),
                        Ok(None) => continue,
                        Err(e) => {
                            tracing::warn!("[RealtimeChannel] Skipping malformed frame: {}", e);
                        }
                    },
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(
                            "[RealtimeChannel] Stream lagged, skipped {} frames",
                            skipped
                        );
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("[RealtimeChannel] Channel closed");
                        return None;
                    }
                }
            }
        })
        .boxed()
    }
}
