//! Subcommand implementations and the shared store bootstrap.

pub mod contacts;
pub mod history;
pub mod send;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use chatsync_application::{ChatStore, Notification, StoreSnapshot};
use chatsync_core::clock::SystemClock;
use chatsync_core::config::ClientConfig;
use chatsync_core::user::{User, UserId};
use chatsync_infrastructure::{BroadcastRealtimeChannel, HttpChatApi};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
}

/// A running store plus the feed its realtime channel reads from.
pub struct Session {
    pub store: ChatStore,
    pub channel: Arc<BroadcastRealtimeChannel>,
    pub notifications: broadcast::Receiver<Notification>,
}

/// Builds the collaborators from `config` and starts the store.
pub fn start(config: &ClientConfig, self_id: &str) -> Result<Session> {
    tracing::info!("[Bootstrap] Starting store as {}", self_id);
    let api = Arc::new(HttpChatApi::from_config(config)?);
    let channel = Arc::new(BroadcastRealtimeChannel::default());
    let store = ChatStore::init(
        api,
        channel.clone(),
        Arc::new(SystemClock),
        UserId::new(self_id),
        config.fallback_notification.clone(),
    );
    let notifications = store.notifications();
    Ok(Session {
        store,
        channel,
        notifications,
    })
}

impl Session {
    /// Resolves `user_id` against the loaded directory.
    pub fn user(&self, user_id: &str) -> User {
        let user_id = UserId::new(user_id);
        match self.store.snapshot().contact(&user_id) {
            Some(row) => row.user.clone(),
            None => {
                tracing::warn!("[Bootstrap] {} is not in the directory", user_id);
                User::new(user_id.clone(), user_id.as_str())
            }
        }
    }

    /// Prints notifications emitted so far to stderr.
    pub fn report_notifications(&mut self) {
        while let Ok(notification) = self.notifications.try_recv() {
            eprintln!("! {:?}: {}", notification.source, notification.text);
        }
    }

    pub async fn close(mut self) {
        self.report_notifications();
        self.store.dispose().await;
    }
}

pub fn print_snapshot(output: Output, snapshot: &StoreSnapshot) -> Result<()> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }
    print_contacts(snapshot);
    if let Some(selected) = &snapshot.selected {
        println!();
        println!("-- {} ({:?}) --", selected.full_name, snapshot.conversation_phase);
        print_transcript(snapshot);
    }
    Ok(())
}

pub fn print_contacts(snapshot: &StoreSnapshot) {
    println!(
        "Contacts ({} online, {} unread, {:?})",
        snapshot.online_count, snapshot.total_unread, snapshot.directory_phase
    );
    for row in &snapshot.contacts {
        let marker = if row.selected { ">" } else { " " };
        let dot = if row.online { "*" } else { " " };
        let badge = if row.unread_count > 0 {
            format!(" [{}]", row.unread_count)
        } else {
            String::new()
        };
        println!(
            "{}{} {} ({}){}  {}",
            marker,
            dot,
            row.user.full_name,
            row.user.id,
            badge,
            row.user.updated_at.to_rfc3339()
        );
    }
}

pub fn print_transcript(snapshot: &StoreSnapshot) {
    for message in &snapshot.transcript {
        let body = message.body().unwrap_or("");
        match &message.image {
            Some(image) => println!(
                "[{}] {}: {} <{}>",
                message.created_at, message.sender_id, body, image
            ),
            None => println!(
                "[{}] {}: {}",
                message.created_at, message.sender_id, body
            ),
        }
    }
}

pub fn show_config(config: &ClientConfig) -> Result<()> {
    let mut shown = config.clone();
    if shown.auth_token.is_some() {
        shown.auth_token = Some("***".to_string());
    }
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}
