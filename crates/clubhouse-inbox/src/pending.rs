//! Optimistic sends.
//!
//! A message the viewer composes is shown immediately as a `Local` entry
//! with [`Delivery::Pending`]. When the backend answers, the entry is
//! replaced by the server record or marked [`Delivery::Failed`]; nothing is
//! rolled back automatically.

use chrono::{DateTime, Utc};
use tracing::debug;

use clubhouse_shared::{Delivery, Message, MessageId, MessageStatus, UserId};

use crate::directory::Directory;
use crate::merge::merge_incoming;
use crate::models::Conversation;

/// Add a pending message from `viewer` to `recipient`, creating the
/// conversation if needed. `reply_to` is the server id of the message being
/// answered, if any. Returns the updated list and the local id.
pub fn append_pending(
    conversations: Vec<Conversation>,
    viewer: UserId,
    recipient: UserId,
    content: &str,
    reply_to: Option<i64>,
    now: DateTime<Utc>,
    directory: &Directory,
) -> (Vec<Conversation>, MessageId) {
    let local = Message {
        id: MessageId::new_local(),
        sender_id: viewer,
        recipient_id: recipient,
        content: content.to_string(),
        sent_at: now,
        status: MessageStatus::Sent,
        can_reply: true,
        reply_to,
        delivery: Delivery::Pending,
    };
    let id = local.id;
    (merge_incoming(conversations, &local, viewer, directory, None), id)
}

/// Replace local entry `local_id` with the confirmed record.
///
/// If the realtime channel already delivered the confirmed record, the local
/// entry is just dropped. Returns `false` when `local_id` is not held.
pub fn confirm_pending(conversations: &mut [Conversation], local_id: MessageId, confirmed: Message) -> bool {
    let Some(conversation) = conversations.iter_mut().find(|c| c.contains(&local_id)) else {
        return false;
    };
    let Some(pos) = conversation.position_of(&local_id) else {
        return false;
    };

    conversation.messages.remove(pos);
    if conversation.contains(&confirmed.id) {
        conversation.refresh_last_message();
        debug!(local = %local_id, server = %confirmed.id, "pending message already delivered");
    } else {
        debug!(local = %local_id, server = %confirmed.id, "pending message confirmed");
        conversation.insert_message(confirmed);
    }
    true
}

/// Mark local entry `local_id` as failed.
pub fn fail_pending(conversations: &mut [Conversation], local_id: MessageId) -> bool {
    set_delivery(conversations, local_id, Delivery::Failed).is_some()
}

/// Put a failed entry back in flight and return a copy to resend.
pub fn retry_pending(conversations: &mut [Conversation], local_id: MessageId) -> Option<Message> {
    set_delivery(conversations, local_id, Delivery::Pending)
}

/// Every local entry still pending or failed, oldest first per conversation.
pub fn unconfirmed(conversations: &[Conversation]) -> Vec<&Message> {
    conversations
        .iter()
        .flat_map(|c| c.messages.iter())
        .filter(|m| m.delivery != Delivery::Confirmed)
        .collect()
}

fn set_delivery(conversations: &mut [Conversation], local_id: MessageId, delivery: Delivery) -> Option<Message> {
    let conversation = conversations.iter_mut().find(|c| c.contains(&local_id))?;
    let message = conversation.messages.iter_mut().find(|m| m.id == local_id)?;
    message.delivery = delivery;
    let copy = message.clone();
    conversation.refresh_last_message();
    Some(copy)
}
