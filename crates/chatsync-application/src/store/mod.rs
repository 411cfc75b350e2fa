//! Chat store: the host-facing handle over the coordinator.
//!
//! # Module Structure
//!
//! - `state`: `ChatState`, the ordering policy over directory, unread and session
//! - `snapshot`: `StoreSnapshot`, `ContactView` and `Notification` published to hosts
//!
//! # Usage
//!
//! ```ignore
//! let store = ChatStore::init(api, realtime, Arc::new(SystemClock), self_id, "Something went wrong");
//! store.subscribe().await?;
//! store.load_directory().await?;
//! store.select_conversation(user).await?;
//! store.send(MessageDraft::text("hi")).await?;
//! store.dispose().await;
//! ```

mod snapshot;
pub(crate) mod state;

pub use snapshot::{ContactView, Notification, NotificationSource, StoreSnapshot};
pub use state::{ChatState, Delivery, PendingSend, Transition};

use std::collections::HashSet;
use std::sync::Arc;

use chatsync_core::api::ChatApi;
use chatsync_core::clock::Clock;
use chatsync_core::error::{Result, SyncError};
use chatsync_core::message::MessageDraft;
use chatsync_core::realtime::RealtimeChannel;
use chatsync_core::user::{User, UserId};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::{Mutex, broadcast, oneshot, watch};
use tokio::task::JoinHandle;

use crate::coordinator::{Command, CoordinatorParts, Reply, SyncCoordinator};

const NOTIFICATION_CAPACITY: usize = 64;

/// Handle to a running chat store.
///
/// Cloning is cheap; every clone talks to the same worker. Command methods
/// resolve once the command and its network continuation have been applied
/// and the resulting snapshot has been published.
#[derive(Clone)]
pub struct ChatStore {
    mailbox: UnboundedSender<Command>,
    snapshots: watch::Receiver<StoreSnapshot>,
    notifications: broadcast::Sender<Notification>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl ChatStore {
    /// Starts the worker. Must be called from within a tokio runtime.
    pub fn init(
        api: Arc<dyn ChatApi>,
        realtime: Arc<dyn RealtimeChannel>,
        clock: Arc<dyn Clock>,
        self_id: UserId,
        fallback_text: impl Into<String>,
    ) -> Self {
        let (mailbox, inbox) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(StoreSnapshot::default());
        let (notifications, _) = broadcast::channel(NOTIFICATION_CAPACITY);

        let coordinator = SyncCoordinator::new(CoordinatorParts {
            api,
            realtime,
            clock,
            self_id,
            fallback_text: fallback_text.into(),
            mailbox: mailbox.downgrade(),
            snapshots: snapshot_tx,
            notifications: notifications.clone(),
        });
        let worker = tokio::spawn(coordinator.run(inbox));

        Self {
            mailbox,
            snapshots,
            notifications,
            worker: Arc::new(Mutex::new(Some(worker))),
        }
    }

    /// Fetches the contact directory. Failures keep the previous list.
    pub async fn load_directory(&self) -> Result<()> {
        self.request(Command::LoadDirectory).await
    }

    /// Opens the conversation with `user`, clears its unread queue and loads
    /// its history.
    pub async fn select_conversation(&self, user: User) -> Result<()> {
        self.request(|reply| Command::Select { user, reply }).await
    }

    pub async fn clear_selection(&self) -> Result<()> {
        self.request(Command::ClearSelection).await
    }

    /// Sends `draft` to the selected counterparty.
    ///
    /// # Errors
    ///
    /// Returns a Logic error when nothing is selected or the draft is empty.
    /// Network and server failures are reported as notifications instead.
    pub async fn send(&self, draft: MessageDraft) -> Result<()> {
        self.request(|reply| Command::Send { draft, reply }).await
    }

    /// Replaces the set of online user ids.
    pub async fn set_presence(&self, online: impl IntoIterator<Item = UserId>) -> Result<()> {
        let online: HashSet<UserId> = online.into_iter().collect();
        self.request(|reply| Command::SetPresence { online, reply }).await
    }

    pub async fn set_online_only(&self, enabled: bool) -> Result<()> {
        self.request(|reply| Command::SetOnlineOnly { enabled, reply }).await
    }

    /// Starts dispatching realtime events. Idempotent.
    pub async fn subscribe(&self) -> Result<()> {
        self.request(Command::Subscribe).await
    }

    /// Stops dispatching realtime events. Idempotent.
    pub async fn unsubscribe(&self) -> Result<()> {
        self.request(Command::Unsubscribe).await
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> StoreSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<StoreSnapshot> {
        self.snapshots.clone()
    }

    pub fn notifications(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    /// Unsubscribes, stops the worker and waits for it. Idempotent.
    ///
    /// Commands issued afterwards fail with a Logic error.
    pub async fn dispose(&self) {
        let Some(worker) = self.worker.lock().await.take() else {
            return;
        };
        if self.mailbox.send(Command::Shutdown).is_err() {
            tracing::debug!("[ChatStore] Worker already stopped");
        }
        if let Err(e) = worker.await {
            tracing::error!("[ChatStore] Worker ended abnormally: {}", e);
        }
        tracing::info!("[ChatStore] Disposed");
    }

    async fn request(&self, command: impl FnOnce(Reply) -> Command) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.mailbox.send(command(reply)).map_err(|_| disposed())?;
        response.await.map_err(|_| disposed())?
    }
}

fn disposed() -> SyncError {
    SyncError::logic("store disposed")
}
