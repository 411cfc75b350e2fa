//! Infrastructure layer for chatsync.
//!
//! Adapters behind the domain contracts: the reqwest-backed chat API, the
//! broadcast-fed realtime channel, and configuration loading.

pub mod broadcast_realtime_channel;
pub mod config_service;
pub mod dto;
pub mod http_chat_api;
pub mod paths;

pub use broadcast_realtime_channel::BroadcastRealtimeChannel;
pub use config_service::ConfigService;
pub use http_chat_api::HttpChatApi;
pub use paths::{ChatsyncPaths, PathError};
