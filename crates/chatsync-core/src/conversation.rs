//! The active conversation: selected counterparty plus its transcript.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};
use crate::message::Message;
use crate::user::{User, UserId};

/// Lifecycle of the active conversation.
///
/// `NoSelection -> LoadingHistory -> HistoryLoaded`, re-entering
/// `LoadingHistory` on every new selection. `HistoryFailed` is reached when
/// the history fetch for the current selection fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    #[default]
    NoSelection,
    LoadingHistory,
    HistoryLoaded,
    HistoryFailed,
}

/// Tag identifying one selection. Responses carrying an older ticket are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SelectionTicket(u64);

impl SelectionTicket {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Result of [`ConversationSession::select`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    /// A new conversation was opened; its history must be fetched.
    Opened(SelectionTicket),
    /// The user was already selected; only unread clearing applies.
    Reconfirmed(SelectionTicket),
}

impl SelectOutcome {
    pub fn ticket(&self) -> SelectionTicket {
        match self {
            Self::Opened(ticket) | Self::Reconfirmed(ticket) => *ticket,
        }
    }
}

/// Holds the selected counterparty and the transcript loaded for it.
///
/// The transcript is only meaningful for the current selection; switching
/// users discards it until the next history load completes.
#[derive(Debug, Clone, Default)]
pub struct ConversationSession {
    selected: Option<User>,
    transcript: Vec<Message>,
    phase: ConversationPhase,
    next_ticket: u64,
    current_ticket: Option<SelectionTicket>,
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<&User> {
        self.selected.as_ref()
    }

    pub fn selected_id(&self) -> Option<&UserId> {
        self.selected.as_ref().map(|u| &u.id)
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn current_ticket(&self) -> Option<SelectionTicket> {
        self.current_ticket
    }

    /// Selects `user`, clearing the transcript.
    ///
    /// Re-selecting the current user keeps everything as is, unless its last
    /// history load failed, in which case the selection is reopened so the
    /// fetch can be retried.
    pub fn select(&mut self, user: User) -> SelectOutcome {
        if let Some(ticket) = self.current_ticket
            && self.selected_id() == Some(&user.id)
            && self.phase != ConversationPhase::HistoryFailed
        {
            return SelectOutcome::Reconfirmed(ticket);
        }

        self.next_ticket += 1;
        let ticket = SelectionTicket(self.next_ticket);
        self.selected = Some(user);
        self.transcript.clear();
        self.phase = ConversationPhase::LoadingHistory;
        self.current_ticket = Some(ticket);
        SelectOutcome::Opened(ticket)
    }

    /// Returns to `NoSelection`, discarding the transcript.
    pub fn clear(&mut self) {
        self.selected = None;
        self.transcript.clear();
        self.phase = ConversationPhase::NoSelection;
        self.current_ticket = None;
    }

    /// Whether `ticket` still identifies the active selection of `user_id`.
    pub fn is_current(&self, ticket: SelectionTicket, user_id: &UserId) -> bool {
        self.current_ticket == Some(ticket) && self.selected_id() == Some(user_id)
    }

    /// Installs fetched history, in the order received.
    ///
    /// Messages appended live while the fetch was in flight are kept after
    /// the history unless the history already contains them.
    pub fn load_history(&mut self, messages: Vec<Message>) {
        let live: Vec<Message> = std::mem::take(&mut self.transcript)
            .into_iter()
            .filter(|m| !messages.iter().any(|h| h.id == m.id))
            .collect();
        self.transcript = messages;
        self.transcript.extend(live);
        self.phase = ConversationPhase::HistoryLoaded;
    }

    /// Marks the history fetch for the current selection as failed.
    pub fn fail_history(&mut self) {
        if self.selected.is_some() {
            self.phase = ConversationPhase::HistoryFailed;
        }
    }

    /// Pushes `message` onto the transcript.
    ///
    /// # Errors
    ///
    /// Returns a Logic error if nothing is selected or the message does not
    /// involve the selected user.
    pub fn append(&mut self, message: Message) -> Result<()> {
        let Some(selected) = self.selected_id() else {
            return Err(SyncError::logic("append with no selected conversation"));
        };
        if !message.involves(selected) {
            return Err(SyncError::logic(format!(
                "message {} does not belong to conversation with {}",
                message.id, selected
            )));
        }
        self.transcript.push(message);
        Ok(())
    }
}
