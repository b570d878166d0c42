//! Batch transform from a flat message history to the conversation list.

use std::collections::HashMap;

use tracing::debug;

use clubhouse_shared::{Message, UserId};

use crate::directory::Directory;
use crate::key::{conversation_key, ConversationKey};
use crate::models::Conversation;

/// Group `messages` into one conversation per counterpart of `viewer`.
///
/// Messages are processed in ascending `sent_at` order (stable, so equal
/// timestamps keep their input order). The result is ordered most recently
/// active first; between equal last timestamps, the conversation whose last
/// message was processed later comes first, as
/// [`merge_incoming`](crate::merge::merge_incoming) would leave it. Messages
/// that do not involve the viewer are skipped.
pub fn aggregate(messages: &[Message], viewer: UserId, directory: &Directory) -> Vec<Conversation> {
    let mut sorted: Vec<&Message> = messages.iter().collect();
    sorted.sort_by_key(|m| m.sent_at);

    let mut index: HashMap<ConversationKey, usize> = HashMap::new();
    let mut conversations: Vec<Conversation> = Vec::new();
    // Processing sequence of each conversation's last message.
    let mut last_seq: Vec<usize> = Vec::new();
    let mut skipped = 0usize;

    for (seq, message) in sorted.into_iter().enumerate() {
        if !message.involves(viewer) {
            skipped += 1;
            continue;
        }

        let other = message.counterpart(viewer);
        let slot = *index
            .entry(conversation_key(viewer, other))
            .or_insert_with(|| {
                conversations.push(Conversation::new(viewer, other, directory));
                last_seq.push(seq);
                conversations.len() - 1
            });
        last_seq[slot] = seq;

        let conversation = &mut conversations[slot];
        conversation.messages.push(message.clone());
        conversation.last_message = Some(message.clone());
        if message.is_unread_for(viewer) {
            conversation.unread_count += 1;
        }
    }

    let mut ranked: Vec<(usize, Conversation)> = last_seq.into_iter().zip(conversations).collect();
    ranked.sort_by(|(seq_a, a), (seq_b, b)| {
        b.last_activity()
            .cmp(&a.last_activity())
            .then_with(|| seq_b.cmp(seq_a))
    });
    let conversations: Vec<Conversation> = ranked.into_iter().map(|(_, c)| c).collect();

    debug!(
        viewer = %viewer,
        messages = messages.len(),
        conversations = conversations.len(),
        skipped,
        "aggregated conversations"
    );

    conversations
}
