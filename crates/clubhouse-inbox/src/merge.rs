//! Incremental application of live messages to an existing conversation
//! list, without re-running aggregation.

use tracing::{debug, trace};

use clubhouse_shared::{Message, UserId};

use crate::directory::Directory;
use crate::key::{conversation_key, ConversationKey};
use crate::models::Conversation;

/// Fold one incoming message into `current`.
///
/// * Messages that do not involve `viewer` leave the list untouched.
/// * The message is inserted at its timestamp position, so delivery order
///   from the transport is not trusted. History is never removed or
///   reordered.
/// * The unread counter grows only for messages from the other party while
///   the conversation is not `focused`.
/// * A conversation whose latest message changed is re-placed by recency
///   with [`place_by_recency`]; under in-order delivery that is the front.
///   A late message that lands mid-history leaves the list order as is.
/// * A server id already present in the conversation is not inserted again;
///   the send acknowledgement echoes messages the session already holds.
pub fn merge_incoming(
    mut current: Vec<Conversation>,
    incoming: &Message,
    viewer: UserId,
    directory: &Directory,
    focused: Option<&ConversationKey>,
) -> Vec<Conversation> {
    if !incoming.involves(viewer) {
        trace!(message = %incoming.id, viewer = %viewer, "ignoring message for another user");
        return current;
    }

    let other = incoming.counterpart(viewer);
    let key = conversation_key(viewer, other);

    match current.iter().position(|c| c.id == key) {
        Some(pos) => {
            let conversation = &mut current[pos];
            if conversation.contains(&incoming.id) {
                debug!(message = %incoming.id, conversation = %key, "duplicate message ignored");
                return current;
            }

            let is_latest = conversation.insert_message(incoming.clone());
            if incoming.is_unread_for(viewer) && focused != Some(&key) {
                conversation.unread_count += 1;
            }

            if is_latest {
                let conversation = current.remove(pos);
                place_by_recency(&mut current, conversation);
            }
        }
        None => {
            let mut conversation = Conversation::new(viewer, other, directory);
            conversation.insert_message(incoming.clone());
            if incoming.is_unread_for(viewer) {
                conversation.unread_count = 1;
            }
            debug!(conversation = %key, "conversation created from live message");
            place_by_recency(&mut current, conversation);
        }
    }

    current
}

/// Insert `conversation` ahead of the first entry that is not strictly more
/// recent, so ties go to the conversation touched last. A conversation
/// without messages goes to the front. Returns the index used.
pub fn place_by_recency(list: &mut Vec<Conversation>, conversation: Conversation) -> usize {
    let pos = match conversation.last_activity() {
        Some(at) => list
            .iter()
            .position(|c| !c.last_activity().is_some_and(|other| other > at))
            .unwrap_or(list.len()),
        None => 0,
    };
    list.insert(pos, conversation);
    pos
}

/// Return the key of the conversation between `viewer` and `other`,
/// prepending an empty one when the pair has none yet.
pub fn open_conversation(
    mut current: Vec<Conversation>,
    viewer: UserId,
    other: UserId,
    directory: &Directory,
) -> (Vec<Conversation>, ConversationKey) {
    let key = conversation_key(viewer, other);
    if !current.iter().any(|c| c.id == key) {
        debug!(conversation = %key, "opened empty conversation");
        current.insert(0, Conversation::new(viewer, other, directory));
    }
    (current, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use crate::testutil::*;
    use clubhouse_shared::MessageId;

    #[test]
    fn test_new_conversation_synthesis() {
        let convs = merge_incoming(Vec::new(), &msg(1, 2, 1, 10), UserId(1), &directory(), None);
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].id, "1_2");
        assert_eq!(convs[0].messages.len(), 1);
        assert_eq!(convs[0].unread_count, 1);
        assert_eq!(convs[0].participant_names[&UserId(2)], "Coach X");
    }

    #[test]
    fn test_own_message_creates_read_conversation() {
        let convs = merge_incoming(Vec::new(), &msg(1, 1, 3, 10), UserId(1), &directory(), None);
        assert_eq!(convs[0].id, "1_3");
        assert_eq!(convs[0].unread_count, 0);
    }

    #[test]
    fn test_irrelevant_message_is_ignored() {
        let dir = directory();
        let current = aggregate(&[msg(1, 2, 1, 10)], UserId(1), &dir);
        let before = current.clone();
        let after = merge_incoming(current, &msg(2, 2, 3, 20), UserId(1), &dir, None);
        assert_eq!(after, before);
    }

    #[test]
    fn test_existing_conversation_moves_to_front() {
        let dir = directory();
        let current = aggregate(&[msg(1, 2, 1, 10), msg(2, 3, 1, 20)], UserId(1), &dir);
        assert_eq!(current[0].id, "1_3");

        let merged = merge_incoming(current, &msg(3, 2, 1, 30), UserId(1), &dir, None);
        assert_eq!(merged[0].id, "1_2");
        assert_eq!(merged[0].unread_count, 2);
        assert_eq!(merged[0].last_message.as_ref().unwrap().id, MessageId::Server(3));
        assert_eq!(merged[1].id, "1_3");
    }

    #[test]
    fn test_focused_conversation_does_not_accumulate_unread() {
        let dir = directory();
        let current = aggregate(&[msg(1, 2, 1, 10)], UserId(1), &dir);
        let key = conversation_key(UserId(1), UserId(2));

        let merged = merge_incoming(current, &msg(2, 2, 1, 20), UserId(1), &dir, Some(&key));
        assert_eq!(merged[0].messages.len(), 2);
        assert_eq!(merged[0].unread_count, 1);
    }

    #[test]
    fn test_out_of_order_arrival_is_sorted_in() {
        let dir = directory();
        let mut convs = Vec::new();
        for m in [msg(1, 2, 1, 10), msg(3, 2, 1, 30), msg(2, 1, 2, 20)] {
            convs = merge_incoming(convs, &m, UserId(1), &dir, None);
        }
        let times: Vec<_> = convs[0].messages.iter().map(|m| m.sent_at).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);
        assert_eq!(convs[0].last_message.as_ref().unwrap().id, MessageId::Server(3));
    }

    #[test]
    fn test_late_message_keeps_list_order() {
        let dir = directory();
        let current = aggregate(&[msg(1, 2, 1, 10), msg(2, 3, 1, 50)], UserId(1), &dir);
        // Older than the latest in "1_2", so "1_3" stays on top.
        let merged = merge_incoming(current, &msg(3, 2, 1, 5), UserId(1), &dir, None);
        assert_eq!(merged[0].id, "1_3");
        assert_eq!(merged[1].messages[0].id, MessageId::Server(3));
    }

    #[test]
    fn test_late_newest_message_is_placed_by_recency() {
        let dir = directory();
        let current = aggregate(&[msg(1, 2, 1, 10), msg(2, 3, 1, 50)], UserId(1), &dir);
        assert_eq!(current[0].id, "1_3");

        // Newest in "1_2" but older than "1_3"'s last message.
        let merged = merge_incoming(current, &msg(3, 2, 1, 20), UserId(1), &dir, None);
        let order: Vec<_> = merged.iter().map(|c| (c.id.to_string(), c.last_activity())).collect();
        assert_eq!(order, vec![("1_3".to_string(), Some(ts(50))), ("1_2".to_string(), Some(ts(20)))]);

        // Same for a conversation created by a late message.
        let merged = merge_incoming(merged, &msg(4, 4, 1, 30), UserId(1), &dir, None);
        let keys: Vec<_> = merged.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(keys, vec!["1_3", "1_4", "1_2"]);
    }

    #[test]
    fn test_place_by_recency() {
        let dir = directory();
        let mut list = aggregate(&[msg(1, 2, 1, 10), msg(2, 3, 1, 30)], UserId(1), &dir);

        let tied = aggregate(&[msg(3, 4, 1, 30)], UserId(1), &dir).remove(0);
        assert_eq!(place_by_recency(&mut list, tied), 0);

        let oldest = aggregate(&[msg(4, 5, 1, 5)], UserId(1), &dir).remove(0);
        assert_eq!(place_by_recency(&mut list, oldest), 3);

        let empty = Conversation::new(UserId(1), UserId(6), &dir);
        assert_eq!(place_by_recency(&mut list, empty), 0);
    }

    #[test]
    fn test_duplicate_server_id_not_appended() {
        let dir = directory();
        let current = aggregate(&[msg(1, 1, 2, 10)], UserId(1), &dir);
        let merged = merge_incoming(current, &msg(1, 1, 2, 10), UserId(1), &dir, None);
        assert_eq!(merged[0].messages.len(), 1);
    }

    #[test]
    fn test_open_conversation_is_eager_and_reused() {
        let dir = directory();
        let current = aggregate(&[msg(1, 2, 1, 10)], UserId(1), &dir);

        let (convs, key) = open_conversation(current, UserId(1), UserId(4), &dir);
        assert_eq!(key, "1_4");
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].id, "1_4");
        assert!(convs[0].messages.is_empty());
        assert!(convs[0].last_message.is_none());

        let (convs, key) = open_conversation(convs, UserId(1), UserId(2), &dir);
        assert_eq!(key, "1_2");
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].id, "1_4");

        // The first live message lands in the pre-created conversation.
        let convs = merge_incoming(convs, &msg(2, 4, 1, 20), UserId(1), &dir, None);
        assert_eq!(convs.len(), 2);
        assert_eq!(convs[0].id, "1_4");
        assert_eq!(convs[0].unread_count, 1);
    }

    #[test]
    fn test_sequential_merges_match_aggregation() {
        let dir = directory();
        let history = vec![msg(1, 2, 1, 10), msg(2, 1, 3, 20), msg(3, 3, 1, 30)];
        let live = vec![
            msg(4, 2, 1, 40),
            msg(5, 4, 1, 50),
            msg(6, 1, 2, 60),
            msg(7, 3, 1, 70),
            msg(8, 2, 1, 80),
        ];

        let mut merged = aggregate(&history, UserId(1), &dir);
        for m in &live {
            merged = merge_incoming(merged, m, UserId(1), &dir, None);
        }

        let all: Vec<_> = history.iter().chain(live.iter()).cloned().collect();
        assert_eq!(merged, aggregate(&all, UserId(1), &dir));
    }

    #[test]
    fn test_equal_timestamps_across_conversations_match_aggregation() {
        let dir = directory();
        let history = vec![msg(1, 4, 1, 5)];
        let live = vec![
            msg(2, 2, 1, 10),
            msg(3, 3, 1, 10),
            msg(4, 1, 4, 10),
            msg(5, 3, 1, 20),
            msg(6, 2, 1, 20),
        ];

        let mut merged = aggregate(&history, UserId(1), &dir);
        for m in &live {
            merged = merge_incoming(merged, m, UserId(1), &dir, None);
        }

        let all: Vec<_> = history.iter().chain(live.iter()).cloned().collect();
        let aggregated = aggregate(&all, UserId(1), &dir);
        let keys: Vec<_> = aggregated.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(keys, vec!["1_2", "1_3", "1_4"]);
        assert_eq!(merged, aggregated);

        let mut merged = Vec::new();
        for m in &live[..2] {
            merged = merge_incoming(merged, m, UserId(1), &dir, None);
        }
        let keys: Vec<_> = merged.iter().map(|c| c.id.to_string()).collect();
        assert_eq!(keys, vec!["1_3", "1_2"]);
        assert_eq!(merged, aggregate(&live[..2], UserId(1), &dir));
    }
}
