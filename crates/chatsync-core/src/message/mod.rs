//! Message domain module.
//!
//! # Module Structure
//!
//! - `model`: received `Message` records and outgoing `MessageDraft`s

mod model;

// Re-export public API
pub use model::{Message, MessageDraft, MessageId};
