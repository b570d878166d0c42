//! Derived conversation state handed to the UI layer.
//!
//! Conversations are never persisted; they are rebuilt from message records
//! by [`crate::aggregate`] and kept current by [`crate::merge`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use clubhouse_shared::constants::VIEWER_FALLBACK_NAME;
use clubhouse_shared::{Message, MessageId, Role, UserId};

use crate::directory::Directory;
use crate::key::{conversation_key, ordered_pair, ConversationKey};

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// All messages exchanged between the viewer and one other user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationKey,
    /// Both participant ids, ascending.
    pub participants: [UserId; 2],
    pub participant_names: BTreeMap<UserId, String>,
    pub participant_roles: BTreeMap<UserId, Role>,
    /// Ascending by `sent_at`; equal timestamps keep arrival order.
    pub messages: Vec<Message>,
    /// Always a copy of the final entry of `messages`.
    pub last_message: Option<Message>,
    pub unread_count: usize,
    pub is_group: bool,
}

impl Conversation {
    /// Empty conversation between `viewer` and `other`, decorated from the
    /// directory. Unknown users get a placeholder name and role; the viewer
    /// falls back to "You".
    pub fn new(viewer: UserId, other: UserId, directory: &Directory) -> Self {
        let mut participant_names = BTreeMap::new();
        let mut participant_roles = BTreeMap::new();

        participant_names.insert(
            viewer,
            directory
                .get(viewer)
                .map(|u| u.display_name.clone())
                .unwrap_or_else(|| VIEWER_FALLBACK_NAME.to_string()),
        );
        participant_roles.insert(viewer, directory.role(viewer));

        if other != viewer {
            participant_names.insert(other, directory.display_name(other));
            participant_roles.insert(other, directory.role(other));
        }

        Self {
            id: conversation_key(viewer, other),
            participants: ordered_pair(viewer, other),
            participant_names,
            participant_roles,
            messages: Vec::new(),
            last_message: None,
            unread_count: 0,
            is_group: false,
        }
    }

    /// The participant that is not `viewer`.
    pub fn other_participant(&self, viewer: UserId) -> UserId {
        let [a, b] = self.participants;
        if a == viewer {
            b
        } else {
            a
        }
    }

    /// Timestamp of the most recent message.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.last_message.as_ref().map(|m| m.sent_at)
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.messages.iter().any(|m| &m.id == id)
    }

    pub fn position_of(&self, id: &MessageId) -> Option<usize> {
        self.messages.iter().position(|m| &m.id == id)
    }

    /// Insert at the timestamp-sorted position, after any entries sharing
    /// the same timestamp. Returns `true` if the message is now the latest.
    pub fn insert_message(&mut self, message: Message) -> bool {
        let pos = self
            .messages
            .partition_point(|m| m.sent_at <= message.sent_at);
        self.messages.insert(pos, message);
        self.refresh_last_message();
        pos + 1 == self.messages.len()
    }

    /// Re-sync `last_message` with the tail of `messages`.
    pub fn refresh_last_message(&mut self) {
        self.last_message = self.messages.last().cloned();
    }
}
