//! Case-insensitive filtering of the conversation list and the roster.

use clubhouse_shared::{User, UserId};

use crate::directory::Directory;
use crate::models::Conversation;

/// Conversations whose other participant matches `query` by name or email.
/// A blank query keeps everything.
pub fn filter_conversations<'a>(
    conversations: &'a [Conversation],
    query: &str,
    viewer: UserId,
    directory: &Directory,
) -> Vec<&'a Conversation> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return conversations.iter().collect();
    }

    conversations
        .iter()
        .filter(|c| {
            let other = c.other_participant(viewer);
            match directory.get(other) {
                Some(user) => contains(&user.display_name, &query) || email_matches(user, &query),
                None => c
                    .participant_names
                    .get(&other)
                    .is_some_and(|name| contains(name, &query)),
            }
        })
        .collect()
}

/// Directory users other than `viewer` matching `query` by name, email or
/// role.
pub fn filter_users<'a>(directory: &'a Directory, query: &str, viewer: UserId) -> Vec<&'a User> {
    let query = query.trim().to_lowercase();
    directory
        .iter()
        .filter(|u| u.id != viewer)
        .filter(|u| {
            query.is_empty()
                || contains(&u.display_name, &query)
                || email_matches(u, &query)
                || contains(u.role.as_str(), &query)
        })
        .collect()
}

fn contains(haystack: &str, lowered_query: &str) -> bool {
    haystack.to_lowercase().contains(lowered_query)
}

fn email_matches(user: &User, lowered_query: &str) -> bool {
    user.email.as_deref().is_some_and(|e| contains(e, lowered_query))
}
