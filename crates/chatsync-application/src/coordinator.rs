//! SyncCoordinator - the single worker that owns the store state.
//!
//! Commands from the handle, network continuations and realtime events all
//! arrive through one mailbox and are applied strictly one at a time. Network
//! calls run in spawned tasks that post their result back as a continuation
//! command, so a slow fetch never holds up other commands.
//!
//! After each transition the worker publishes a fresh snapshot, then answers
//! the waiting caller. Recoverable failures become notifications and are
//! answered with `Ok(())`; only Logic errors reach the caller.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use chatsync_core::api::ChatApi;
use chatsync_core::clock::Clock;
use chatsync_core::conversation::{SelectOutcome, SelectionTicket};
use chatsync_core::error::{Result, SyncError};
use chatsync_core::message::{Message, MessageDraft};
use chatsync_core::realtime::RealtimeChannel;
use chatsync_core::user::{User, UserId};
use tokio::sync::mpsc::{UnboundedReceiver, WeakUnboundedSender};
use tokio::sync::{broadcast, oneshot, watch};

use crate::realtime::RealtimeSubscription;
use crate::store::state::{ChatState, Transition};
use crate::store::{Notification, NotificationSource, StoreSnapshot};

pub(crate) type Reply = oneshot::Sender<Result<()>>;

/// Everything the worker can be asked to do.
pub(crate) enum Command {
    LoadDirectory(Reply),
    DirectoryFetched {
        result: Result<Vec<User>>,
        reply: Reply,
    },
    Select {
        user: User,
        reply: Reply,
    },
    HistoryFetched {
        ticket: SelectionTicket,
        user_id: UserId,
        result: Result<Vec<Message>>,
        reply: Reply,
    },
    ClearSelection(Reply),
    Send {
        draft: MessageDraft,
        reply: Reply,
    },
    SendCompleted {
        ticket: SelectionTicket,
        receiver_id: UserId,
        result: Result<Message>,
        reply: Reply,
    },
    SetPresence {
        online: HashSet<UserId>,
        reply: Reply,
    },
    SetOnlineOnly {
        enabled: bool,
        reply: Reply,
    },
    Subscribe(Reply),
    Unsubscribe(Reply),
    Incoming {
        generation: u64,
        message: Message,
    },
    RealtimeEnded {
        generation: u64,
    },
    Shutdown,
}

/// Collaborators and output channels handed to the worker at startup.
pub(crate) struct CoordinatorParts {
    pub api: Arc<dyn ChatApi>,
    pub realtime: Arc<dyn RealtimeChannel>,
    pub clock: Arc<dyn Clock>,
    pub self_id: UserId,
    pub fallback_text: String,
    pub mailbox: WeakUnboundedSender<Command>,
    pub snapshots: watch::Sender<StoreSnapshot>,
    pub notifications: broadcast::Sender<Notification>,
}

pub(crate) struct SyncCoordinator {
    state: ChatState,
    api: Arc<dyn ChatApi>,
    clock: Arc<dyn Clock>,
    realtime: RealtimeSubscription,
    mailbox: WeakUnboundedSender<Command>,
    snapshots: watch::Sender<StoreSnapshot>,
    notifications: broadcast::Sender<Notification>,
    fallback_text: String,
}

impl SyncCoordinator {
    pub(crate) fn new(parts: CoordinatorParts) -> Self {
        Self {
            state: ChatState::new(parts.self_id),
            api: parts.api,
            clock: parts.clock,
            realtime: RealtimeSubscription::new(parts.realtime),
            mailbox: parts.mailbox,
            snapshots: parts.snapshots,
            notifications: parts.notifications,
            fallback_text: parts.fallback_text,
        }
    }

    /// Processes the mailbox until `Shutdown` or until every sender is gone.
    pub(crate) async fn run(mut self, mut inbox: UnboundedReceiver<Command>) {
        tracing::info!(
            "[SyncCoordinator] Worker started for user {}",
            self.state.self_id()
        );
        while let Some(command) = inbox.recv().await {
            if matches!(command, Command::Shutdown) {
                break;
            }
            self.handle(command);
        }

        // Queued commands are dropped with their replies, which the handle
        // reports as a disposed store.
        inbox.close();
        if self.realtime.unsubscribe() {
            self.state.set_subscribed(false);
            self.publish();
        }
        tracing::info!("[SyncCoordinator] Worker stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::LoadDirectory(reply) => self.load_directory(reply),
            Command::DirectoryFetched { result, reply } => {
                let outcome = self.state.finish_directory_load(result);
                if outcome.is_ok() {
                    tracing::info!(
                        "[SyncCoordinator] Directory loaded: {} users",
                        self.state.directory().len()
                    );
                }
                self.publish();
                self.settle(reply, NotificationSource::Directory, outcome);
            }
            Command::Select { user, reply } => self.select(user, reply),
            Command::HistoryFetched {
                ticket,
                user_id,
                result,
                reply,
            } => {
                let now = self.clock.now();
                let outcome = self
                    .state
                    .finish_history_load(ticket, &user_id, result, now)
                    .map(|transition| match transition {
                        Transition::Applied => tracing::debug!(
                            "[SyncCoordinator] History loaded for {}: {} messages",
                            user_id,
                            self.state.session().transcript().len()
                        ),
                        Transition::Stale => tracing::debug!(
                            "[SyncCoordinator] Dropping stale history for {} (ticket {})",
                            user_id,
                            ticket.value()
                        ),
                    });
                self.publish();
                self.settle(reply, NotificationSource::History, outcome);
            }
            Command::ClearSelection(reply) => {
                self.state.clear_selection();
                self.publish();
                let _ = reply.send(Ok(()));
            }
            Command::Send { draft, reply } => self.send(draft, reply),
            Command::SendCompleted {
                ticket,
                receiver_id,
                result,
                reply,
            } => {
                let now = self.clock.now();
                let outcome = self
                    .state
                    .finish_send(ticket, &receiver_id, result, now)
                    .map(|transition| {
                        if transition == Transition::Stale {
                            tracing::debug!(
                                "[SyncCoordinator] Send to {} acknowledged but not appended",
                                receiver_id
                            );
                        }
                    });
                self.publish();
                self.settle(reply, NotificationSource::Send, outcome);
            }
            Command::SetPresence { online, reply } => {
                self.state.set_presence(online);
                self.publish();
                let _ = reply.send(Ok(()));
            }
            Command::SetOnlineOnly { enabled, reply } => {
                self.state.set_online_only(enabled);
                self.publish();
                let _ = reply.send(Ok(()));
            }
            Command::Subscribe(reply) => {
                if self.realtime.subscribe(self.mailbox.clone()) {
                    tracing::info!("[SyncCoordinator] Subscribed to realtime channel");
                } else {
                    tracing::debug!("[SyncCoordinator] Already subscribed");
                }
                self.state.set_subscribed(self.realtime.is_active());
                self.publish();
                let _ = reply.send(Ok(()));
            }
            Command::Unsubscribe(reply) => {
                if self.realtime.unsubscribe() {
                    tracing::info!("[SyncCoordinator] Unsubscribed from realtime channel");
                } else {
                    tracing::debug!("[SyncCoordinator] Not subscribed");
                }
                self.state.set_subscribed(false);
                self.publish();
                let _ = reply.send(Ok(()));
            }
            Command::Incoming {
                generation,
                message,
            } => {
                if !self.realtime.is_current(generation) {
                    tracing::debug!(
                        "[SyncCoordinator] Dropping message {} from closed subscription",
                        message.id
                    );
                    return;
                }
                let message_id = message.id.clone();
                let delivery = self.state.receive(message, self.clock.now());
                tracing::debug!(
                    "[SyncCoordinator] Message {} routed to {:?}",
                    message_id,
                    delivery
                );
                self.publish();
            }
            Command::RealtimeEnded { generation } => {
                if self.realtime.end(generation) {
                    tracing::warn!("[SyncCoordinator] Realtime stream ended, subscription closed");
                    self.state.set_subscribed(false);
                    self.publish();
                }
            }
            Command::Shutdown => {}
        }
    }

    fn load_directory(&mut self, reply: Reply) {
        self.state.begin_directory_load();
        self.publish();
        let api = Arc::clone(&self.api);
        self.spawn_continuation(async move {
            let result = api.fetch_directory().await;
            Command::DirectoryFetched { result, reply }
        });
    }

    fn select(&mut self, user: User, reply: Reply) {
        let user_id = user.id.clone();
        match self.state.open_conversation(user) {
            SelectOutcome::Reconfirmed(_) => {
                tracing::debug!("[SyncCoordinator] {} already selected", user_id);
                self.publish();
                let _ = reply.send(Ok(()));
            }
            SelectOutcome::Opened(ticket) => {
                tracing::info!(
                    "[SyncCoordinator] Opened conversation with {} (ticket {})",
                    user_id,
                    ticket.value()
                );
                self.publish();
                let api = Arc::clone(&self.api);
                self.spawn_continuation(async move {
                    let result = api.fetch_history(&user_id).await;
                    Command::HistoryFetched {
                        ticket,
                        user_id,
                        result,
                        reply,
                    }
                });
            }
        }
    }

    fn send(&mut self, draft: MessageDraft, reply: Reply) {
        let pending = match self.state.prepare_send(draft) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::warn!("[SyncCoordinator] Rejected send: {}", e);
                let _ = reply.send(Err(e));
                return;
            }
        };
        let api = Arc::clone(&self.api);
        self.spawn_continuation(async move {
            let result = api
                .send_message(&pending.receiver_id, &pending.draft)
                .await;
            Command::SendCompleted {
                ticket: pending.ticket,
                receiver_id: pending.receiver_id,
                result,
                reply,
            }
        });
    }

    /// Runs `work` off the worker and posts the command it yields back into
    /// the mailbox.
    fn spawn_continuation<F>(&self, work: F)
    where
        F: Future<Output = Command> + Send + 'static,
    {
        let Some(mailbox) = self.mailbox.upgrade() else {
            tracing::debug!("[SyncCoordinator] Store dropped, skipping request");
            return;
        };
        tokio::spawn(async move {
            let command = work.await;
            if mailbox.send(command).is_err() {
                tracing::debug!("[SyncCoordinator] Store disposed before response arrived");
            }
        });
    }

    /// Answers a caller, absorbing recoverable failures into a notification.
    fn settle(&self, reply: Reply, source: NotificationSource, outcome: Result<()>) {
        let result = match outcome {
            Err(e) if e.is_recoverable() => {
                tracing::warn!("[SyncCoordinator] {:?} command failed: {}", source, e);
                self.notify(source, &e);
                Ok(())
            }
            other => other,
        };
        let _ = reply.send(result);
    }

    fn notify(&self, source: NotificationSource, error: &SyncError) {
        let notification = Notification {
            source,
            text: error.notification_text(&self.fallback_text),
        };
        if self.notifications.send(notification).is_err() {
            tracing::debug!("[SyncCoordinator] No notification listeners");
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot());
    }
}
