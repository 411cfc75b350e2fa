//! Application layer for chatsync.
//!
//! Hosts the synchronization store: a single worker that serializes user
//! commands, network continuations and realtime events over the domain
//! components, and the `ChatStore` handle hosts use to drive it.

mod coordinator;
mod realtime;
pub mod store;

pub use store::{ChatStore, ContactView, Notification, NotificationSource, StoreSnapshot};
