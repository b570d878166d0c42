//! # clubhouse-inbox
//!
//! Conversation state for the club's direct messaging.
//!
//! Everything here is a synchronous, in-memory transform over message
//! records: [`aggregate`](aggregate::aggregate) builds the conversation list
//! from a fetched history, [`merge_incoming`](merge::merge_incoming) folds
//! live messages into it, and [`mark_seen`](seen::mark_seen) is the single
//! way unread counters go down. State is owned by the caller and passed in
//! explicitly; the crate keeps none of its own.

pub mod aggregate;
pub mod broadcast;
pub mod directory;
pub mod key;
pub mod merge;
pub mod models;
pub mod pending;
pub mod replies;
pub mod search;
pub mod seen;

#[cfg(test)]
mod testutil;

pub use aggregate::aggregate;
pub use directory::Directory;
pub use key::{conversation_key, ConversationKey};
pub use merge::{merge_incoming, open_conversation, place_by_recency};
pub use models::*;
pub use replies::{group_replies, MessageThread};
pub use seen::mark_seen;
