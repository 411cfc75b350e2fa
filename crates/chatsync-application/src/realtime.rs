//! Realtime subscription owned by the coordinator.
//!
//! At most one pump task runs at a time. The pump forwards every inbound
//! message into the mailbox tagged with its generation, so events that were
//! already in flight when an unsubscribe was processed can be recognised
//! and dropped. A pump whose stream ends on its own reports that with
//! `Command::RealtimeEnded`, so the next subscribe opens the channel again.

use std::sync::Arc;

use chatsync_core::realtime::{RealtimeChannel, RealtimeEvent};
use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::coordinator::Command;

pub(crate) struct RealtimeSubscription {
    channel: Arc<dyn RealtimeChannel>,
    active: Option<(u64, CancellationToken)>,
    generation: u64,
}

impl RealtimeSubscription {
    pub(crate) fn new(channel: Arc<dyn RealtimeChannel>) -> Self {
        Self {
            channel,
            active: None,
            generation: 0,
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Whether events tagged with `generation` should still be dispatched.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.active.as_ref().is_some_and(|(g, _)| *g == generation)
    }

    /// Opens the channel and starts pumping into `mailbox`.
    ///
    /// Returns `false` without side effects when already subscribed.
    pub(crate) fn subscribe(&mut self, mailbox: WeakUnboundedSender<Command>) -> bool {
        if self.active.is_some() {
            return false;
        }
        self.generation += 1;
        let generation = self.generation;
        let token = CancellationToken::new();
        let events = self.channel.open();
        tokio::spawn(pump(generation, events, mailbox, token.clone()));
        self.active = Some((generation, token));
        true
    }

    /// Forgets a subscription whose stream ended on its own.
    ///
    /// Returns `false` for a generation that is no longer current.
    pub(crate) fn end(&mut self, generation: u64) -> bool {
        if !self.is_current(generation) {
            return false;
        }
        self.active = None;
        true
    }

    /// Stops the pump. Returns `false` when not subscribed.
    pub(crate) fn unsubscribe(&mut self) -> bool {
        match self.active.take() {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }
}

impl Drop for RealtimeSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

async fn pump(
    generation: u64,
    mut events: BoxStream<'static, RealtimeEvent>,
    mailbox: WeakUnboundedSender<Command>,
    token: CancellationToken,
) {
    tracing::debug!("[Realtime] Pump {} started", generation);
    loop {
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            event = events.next() => event,
        };
        let Some(RealtimeEvent::NewMessage(message)) = event else {
            tracing::info!("[Realtime] Event stream ended");
            if let Some(sender) = mailbox.upgrade() {
                let _ = sender.send(Command::RealtimeEnded { generation });
            }
            break;
        };
        let Some(sender) = mailbox.upgrade() else {
            break;
        };
        if sender.send(Command::Incoming { generation, message }).is_err() {
            break;
        }
    }
    tracing::debug!("[Realtime] Pump {} stopped", generation);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct CountingChannel {
        opened: AtomicUsize,
        ends: bool,
    }

    impl RealtimeChannel for CountingChannel {
        fn open(&self) -> BoxStream<'static, RealtimeEvent> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            if self.ends {
                futures::stream::empty().boxed()
            } else {
                futures::stream::pending().boxed()
            }
        }
    }

    #[tokio::test]
    async fn test_subscribe_twice_opens_once() {
        let channel = Arc::new(CountingChannel::default());
        let (tx, _rx) = mpsc::unbounded_channel::<Command>();
        let mut subscription = RealtimeSubscription::new(channel.clone());

        assert!(subscription.subscribe(tx.downgrade()));
        assert!(!subscription.subscribe(tx.downgrade()));
        assert_eq!(channel.opened.load(Ordering::SeqCst), 1);
        assert!(subscription.is_current(1));
    }

    #[tokio::test]
    async fn test_resubscribe_moves_generation() {
        let channel = Arc::new(CountingChannel::default());
        let (tx, _rx) = mpsc::unbounded_channel::<Command>();
        let mut subscription = RealtimeSubscription::new(channel.clone());

        assert!(!subscription.unsubscribe());
        subscription.subscribe(tx.downgrade());
        assert!(subscription.unsubscribe());
        assert!(!subscription.is_active());
        assert!(!subscription.is_current(1));

        subscription.subscribe(tx.downgrade());
        assert!(subscription.is_current(2));
        assert!(!subscription.is_current(1));
        assert_eq!(channel.opened.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_ended_stream_reports_and_allows_reopen() {
        let channel = Arc::new(CountingChannel {
            ends: true,
            ..CountingChannel::default()
        });
        let (tx, mut rx) = mpsc::unbounded_channel::<Command>();
        let mut subscription = RealtimeSubscription::new(channel.clone());

        subscription.subscribe(tx.downgrade());
        let Some(Command::RealtimeEnded { generation }) = rx.recv().await else {
            panic!("expected the pump to report the end of its stream");
        };
        assert_eq!(generation, 1);

        // A late report from an older pump is ignored
        assert!(!subscription.end(7));
        assert!(subscription.end(generation));
        assert!(!subscription.is_active());

        assert!(subscription.subscribe(tx.downgrade()));
        assert_eq!(channel.opened.load(Ordering::SeqCst), 2);
    }
}
