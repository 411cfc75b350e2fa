//! Shared test doubles for the store integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chatsync_application::{ChatStore, StoreSnapshot};
use chatsync_core::api::ChatApi;
use chatsync_core::clock::Clock;
use chatsync_core::error::{Result, SyncError};
use chatsync_core::message::{Message, MessageDraft};
use chatsync_core::user::{User, UserId};
use chatsync_infrastructure::BroadcastRealtimeChannel;
use chrono::{DateTime, TimeZone, Utc};
use tokio::sync::Notify;

pub const FALLBACK: &str = "Something went wrong";
pub const SELF_ID: &str = "me";

pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn msg(id: &str, from: &str, to: &str, text: &str, created: i64) -> Message {
    Message::new(id, from, to, text, at(created))
}

/// A `newMessage` frame as the realtime connection delivers it.
pub fn frame(message: &Message) -> String {
    serde_json::json!({
        "event": "newMessage",
        "data": {
            "_id": message.id.as_str(),
            "senderId": message.sender_id.as_str(),
            "receiverId": message.receiver_id.as_str(),
            "text": message.text,
            "createdAt": message.created_at.to_rfc3339(),
        }
    })
    .to_string()
}

/// ChatApi with scripted responses.
pub struct ScriptedApi {
    directory: Mutex<Result<Vec<User>>>,
    histories: Mutex<HashMap<UserId, Result<Vec<Message>>>>,
    history_gates: Mutex<HashMap<UserId, Arc<Notify>>>,
    send_results: Mutex<VecDeque<Result<Message>>>,
    send_gate: Mutex<Option<Arc<Notify>>>,
    sent: Mutex<Vec<(UserId, MessageDraft)>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self {
            directory: Mutex::new(Ok(Vec::new())),
            histories: Mutex::new(HashMap::new()),
            history_gates: Mutex::new(HashMap::new()),
            send_results: Mutex::new(VecDeque::new()),
            send_gate: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_directory(&self, result: Result<Vec<User>>) {
        *self.directory.lock().unwrap() = result;
    }

    pub fn set_history(&self, user_id: &str, result: Result<Vec<Message>>) {
        self.histories
            .lock()
            .unwrap()
            .insert(UserId::new(user_id), result);
    }

    /// Holds history fetches for `user_id` until the returned gate is notified.
    pub fn gate_history(&self, user_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.history_gates
            .lock()
            .unwrap()
            .insert(UserId::new(user_id), gate.clone());
        gate
    }

    /// Holds every send until the returned gate is notified.
    pub fn gate_send(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.send_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn push_send_result(&self, result: Result<Message>) {
        self.send_results.lock().unwrap().push_back(result);
    }

    pub fn sent(&self) -> Vec<(UserId, MessageDraft)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatApi for ScriptedApi {
    async fn fetch_directory(&self) -> Result<Vec<User>> {
        self.directory.lock().unwrap().clone()
    }

    async fn fetch_history(&self, counterpart: &UserId) -> Result<Vec<Message>> {
        let gate = self.history_gates.lock().unwrap().get(counterpart).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.histories
            .lock()
            .unwrap()
            .get(counterpart)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn send_message(&self, counterpart: &UserId, draft: &MessageDraft) -> Result<Message> {
        self.sent
            .lock()
            .unwrap()
            .push((counterpart.clone(), draft.clone()));
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(SyncError::transport("no scripted response")))
    }
}

/// Clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(secs: i64) -> Self {
        Self {
            now: Mutex::new(at(secs)),
        }
    }

    pub fn set(&self, secs: i64) {
        *self.now.lock().unwrap() = at(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct Harness {
    pub store: ChatStore,
    pub api: Arc<ScriptedApi>,
    pub clock: Arc<ManualClock>,
    pub channel: Arc<BroadcastRealtimeChannel>,
}

impl Harness {
    pub fn start() -> Self {
        let api = Arc::new(ScriptedApi::new());
        let clock = Arc::new(ManualClock::new(100));
        let channel = Arc::new(BroadcastRealtimeChannel::default());
        let store = ChatStore::init(
            api.clone(),
            channel.clone(),
            clock.clone(),
            UserId::new(SELF_ID),
            FALLBACK,
        );
        Self {
            store,
            api,
            clock,
            channel,
        }
    }

    /// Starts a store with X(t=10), Y(t=20), Z(t=5) loaded and subscribed.
    pub async fn loaded() -> Self {
        let harness = Self::start();
        harness.api.set_directory(Ok(vec![
            User::new("x", "Xavier").with_updated_at(at(10)),
            User::new("y", "Yuki").with_updated_at(at(20)),
            User::new("z", "Zoe").with_updated_at(at(5)),
        ]));
        harness.store.subscribe().await.unwrap();
        harness.store.load_directory().await.unwrap();
        harness
    }

    pub fn user(&self, id: &str) -> User {
        self.store
            .snapshot()
            .contact(&UserId::new(id))
            .map(|c| c.user.clone())
            .unwrap_or_else(|| User::new(id, id))
    }

    pub fn deliver(&self, message: &Message) {
        self.channel.publish(frame(message));
    }

    /// Waits until a published snapshot satisfies `predicate`.
    pub async fn wait_for(&self, predicate: impl FnMut(&StoreSnapshot) -> bool) -> StoreSnapshot {
        let mut snapshots = self.store.watch();
        let snapshot = tokio::time::timeout(Duration::from_secs(2), snapshots.wait_for(predicate))
            .await
            .expect("timed out waiting for snapshot")
            .expect("store closed");
        snapshot.clone()
    }

    /// Waits until `count` sends have reached the api.
    pub async fn wait_for_sends(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.api.sent().len() < count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for send");
    }

    /// Waits until the realtime channel has exactly `count` open streams.
    pub async fn wait_for_subscribers(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while self.channel.subscriber_count() != count {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for subscriber count");
    }
}
