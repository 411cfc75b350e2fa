//! ChatState - the ordering policy applied to the three leaf components.
//!
//! Every method is synchronous and runs on the coordinator's worker, so each
//! transition sees the state left by the previous one. Network results come
//! in through the `finish_*` methods together with the selection they were
//! issued for.

use std::collections::HashSet;

use chatsync_core::conversation::{ConversationSession, SelectOutcome, SelectionTicket};
use chatsync_core::directory::ContactDirectory;
use chatsync_core::error::{Result, SyncError};
use chatsync_core::message::{Message, MessageDraft};
use chatsync_core::unread::UnreadTracker;
use chatsync_core::user::{User, UserId};
use chrono::{DateTime, Utc};

use super::snapshot::{ContactView, StoreSnapshot};

/// Whether a network result was applied or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Stale,
}

/// Where an incoming message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Transcript,
    Unread,
}

/// A send that passed its preconditions and may go on the wire.
#[derive(Debug, Clone)]
pub struct PendingSend {
    pub ticket: SelectionTicket,
    pub receiver_id: UserId,
    pub draft: MessageDraft,
}

#[derive(Debug, Clone)]
pub struct ChatState {
    self_id: UserId,
    directory: ContactDirectory,
    unread: UnreadTracker,
    session: ConversationSession,
    online: HashSet<UserId>,
    online_only: bool,
    subscribed: bool,
}

impl ChatState {
    pub fn new(self_id: UserId) -> Self {
        Self {
            self_id,
            directory: ContactDirectory::new(),
            unread: UnreadTracker::new(),
            session: ConversationSession::new(),
            online: HashSet::new(),
            online_only: false,
            subscribed: false,
        }
    }

    pub fn self_id(&self) -> &UserId {
        &self.self_id
    }

    pub fn directory(&self) -> &ContactDirectory {
        &self.directory
    }

    pub fn unread(&self) -> &UnreadTracker {
        &self.unread
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    // ============================================================================
    // Directory
    // ============================================================================

    pub fn begin_directory_load(&mut self) {
        self.directory.begin_loading();
    }

    /// Applies a directory fetch. On failure the list is kept and the error
    /// is handed back for notification.
    pub fn finish_directory_load(&mut self, result: Result<Vec<User>>) -> Result<()> {
        match result {
            Ok(users) => {
                self.directory.load(users);
                Ok(())
            }
            Err(e) => {
                self.directory.fail();
                Err(e)
            }
        }
    }

    // ============================================================================
    // Conversation
    // ============================================================================

    /// Selects `user` and clears its unread queue.
    pub fn open_conversation(&mut self, user: User) -> SelectOutcome {
        let user_id = user.id.clone();
        let outcome = self.session.select(user);
        self.unread.clear(&user_id);
        outcome
    }

    /// Applies a history fetch issued under `ticket` for `user_id`.
    ///
    /// A result for a selection that is no longer current is dropped without
    /// any state change, failures included.
    pub fn finish_history_load(
        &mut self,
        ticket: SelectionTicket,
        user_id: &UserId,
        result: Result<Vec<Message>>,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        if !self.session.is_current(ticket, user_id) {
            return Ok(Transition::Stale);
        }
        match result {
            Ok(messages) => {
                self.session.load_history(messages);
                self.unread.clear(user_id);
                self.directory.touch(user_id, now);
                Ok(Transition::Applied)
            }
            Err(e) => {
                self.session.fail_history();
                Err(e)
            }
        }
    }

    pub fn clear_selection(&mut self) {
        self.session.clear();
    }

    // ============================================================================
    // Send
    // ============================================================================

    /// Checks the send preconditions.
    ///
    /// # Errors
    ///
    /// Returns a Logic error when nothing is selected or the draft is empty.
    pub fn prepare_send(&self, draft: MessageDraft) -> Result<PendingSend> {
        let (Some(ticket), Some(receiver_id)) =
            (self.session.current_ticket(), self.session.selected_id())
        else {
            return Err(SyncError::logic("send with no selected conversation"));
        };
        if draft.is_empty() {
            return Err(SyncError::logic("send with an empty draft"));
        }
        Ok(PendingSend {
            ticket,
            receiver_id: receiver_id.clone(),
            draft,
        })
    }

    /// Applies a send completion.
    ///
    /// The acknowledged message is appended only if its selection is still
    /// current and it belongs to that conversation; the receiver is touched
    /// either way. A failure changes nothing.
    pub fn finish_send(
        &mut self,
        ticket: SelectionTicket,
        receiver_id: &UserId,
        result: Result<Message>,
        now: DateTime<Utc>,
    ) -> Result<Transition> {
        let message = result?;
        self.directory.touch(receiver_id, now);
        if !self.session.is_current(ticket, receiver_id) {
            return Ok(Transition::Stale);
        }
        match self.session.append(message) {
            Ok(()) => Ok(Transition::Applied),
            Err(e) => {
                tracing::warn!("[ChatState] Acknowledged send not appended: {}", e);
                Ok(Transition::Stale)
            }
        }
    }

    // ============================================================================
    // Realtime
    // ============================================================================

    /// Routes an incoming message against the selection at processing time,
    /// then touches the sender.
    pub fn receive(&mut self, message: Message, now: DateTime<Utc>) -> Delivery {
        let sender_id = message.sender_id.clone();
        let delivery = if self.session.selected_id() == Some(&sender_id) {
            // sender is the selected user, so append cannot reject it
            if let Err(e) = self.session.append(message) {
                tracing::error!("[ChatState] Append of incoming message failed: {}", e);
            }
            Delivery::Transcript
        } else {
            self.unread.enqueue(&sender_id, message);
            Delivery::Unread
        };
        self.directory.touch(&sender_id, now);
        delivery
    }

    // ============================================================================
    // View inputs
    // ============================================================================

    pub fn set_presence(&mut self, online: HashSet<UserId>) {
        self.online = online;
    }

    pub fn set_online_only(&mut self, enabled: bool) {
        self.online_only = enabled;
    }

    pub fn set_subscribed(&mut self, subscribed: bool) {
        self.subscribed = subscribed;
    }

    pub fn online_count(&self) -> usize {
        self.online.iter().filter(|id| **id != self.self_id).count()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        let selected_id = self.session.selected_id();
        let contacts = self
            .directory
            .filtered(&self.online, self.online_only)
            .into_iter()
            .map(|user| ContactView {
                online: self.online.contains(&user.id),
                unread_count: self.unread.count_for(&user.id),
                selected: selected_id == Some(&user.id),
                user,
            })
            .collect();

        StoreSnapshot {
            contacts,
            directory_phase: self.directory.phase(),
            selected: self.session.selected().cloned(),
            conversation_phase: self.session.phase(),
            transcript: self.session.transcript().to_vec(),
            unread: self.unread.counts(),
            total_unread: self.unread.total(),
            online_count: self.online_count(),
            online_only: self.online_only,
            subscribed: self.subscribed,
        }
    }
}
