//! Explicit "mark seen": the only operation that lowers an unread counter.

use tracing::debug;

use clubhouse_shared::{MessageStatus, UserId};

use crate::key::ConversationKey;
use crate::models::Conversation;

/// Flip every unseen message from the other party in conversation `key` to
/// [`MessageStatus::Seen`] and reset its unread counter.
///
/// Returns the server ids whose status changed, for the caller to persist.
/// An unknown key changes nothing.
pub fn mark_seen(conversations: &mut [Conversation], key: &ConversationKey, viewer: UserId) -> Vec<i64> {
    let Some(conversation) = conversations.iter_mut().find(|c| &c.id == key) else {
        return Vec::new();
    };

    let mut changed = Vec::new();
    for message in conversation.messages.iter_mut() {
        if message.is_unread_for(viewer) {
            message.status = MessageStatus::Seen;
            if let Some(id) = message.id.server() {
                changed.push(id);
            }
        }
    }

    conversation.unread_count = 0;
    conversation.refresh_last_message();

    debug!(conversation = %key, marked = changed.len(), "conversation marked seen");
    changed
}

/// Total unread messages across all conversations.
pub fn total_unread(conversations: &[Conversation]) -> usize {
    conversations.iter().map(|c| c.unread_count).sum()
}
