//! User domain module.
//!
//! # Module Structure
//!
//! - `model`: `User` record and its `UserId`
//!
//! # Usage
//!
//! ```ignore
//! use chatsync_core::user::{User, UserId};
//! ```

mod model;

// Re-export public API
pub use model::{User, UserId};
