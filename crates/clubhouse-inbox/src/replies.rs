//! Reply threads within a conversation.

use std::collections::HashMap;

use clubhouse_shared::Message;

/// A top-level message and every reply that leads back to it.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageThread<'a> {
    pub root: &'a Message,
    /// In the order of the input slice.
    pub replies: Vec<&'a Message>,
}

/// Group `messages` (one conversation, chronological) into threads.
///
/// A reply to a reply is attached to the top of its chain. A message whose
/// parent is not in `messages` starts its own thread, as does any message on
/// a `reply_to` cycle. Threads follow the order of their roots.
pub fn group_replies(messages: &[Message]) -> Vec<MessageThread<'_>> {
    let by_id: HashMap<i64, usize> = messages
        .iter()
        .enumerate()
        .filter_map(|(i, m)| m.id.server().map(|id| (id, i)))
        .collect();

    let root_of = |start: usize| -> usize {
        let mut current = start;
        for _ in 0..messages.len() {
            match messages[current].reply_to.and_then(|p| by_id.get(&p)) {
                Some(&parent) if parent != current => current = parent,
                _ => return current,
            }
        }
        start
    };

    let roots: Vec<usize> = (0..messages.len()).map(root_of).collect();

    let mut slot: HashMap<usize, usize> = HashMap::new();
    let mut threads: Vec<MessageThread<'_>> = Vec::new();
    for (i, message) in messages.iter().enumerate() {
        if roots[i] == i {
            slot.insert(i, threads.len());
            threads.push(MessageThread {
                root: message,
                replies: Vec::new(),
            });
        }
    }

    for (i, message) in messages.iter().enumerate() {
        if roots[i] != i {
            if let Some(&t) = slot.get(&roots[i]) {
                threads[t].replies.push(message);
            }
        }
    }

    threads
}
