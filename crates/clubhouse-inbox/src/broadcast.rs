//! Expansion of tagged recipients (`@everyone`, `@coaches`, `@members`)
//! into concrete user ids.

use std::collections::HashSet;

use clubhouse_shared::protocol::{BroadcastTag, Recipient};
use clubhouse_shared::{Role, User, UserId};

use crate::directory::Directory;

/// Resolve `recipients` to a de-duplicated list in first-mention order.
///
/// Explicit users are kept as given. Tags only expand to active users and
/// never include `sender`.
pub fn resolve_recipients(recipients: &[Recipient], directory: &Directory, sender: UserId) -> Vec<UserId> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    let mut push = |id: UserId| {
        if seen.insert(id) {
            resolved.push(id);
        }
    };

    for recipient in recipients {
        match recipient {
            Recipient::User(id) => push(*id),
            Recipient::Tag(tag) => directory
                .iter()
                .filter(|u| u.is_active() && u.id != sender && tag_matches(*tag, u))
                .for_each(|u| push(u.id)),
        }
    }

    resolved
}

fn tag_matches(tag: BroadcastTag, user: &User) -> bool {
    match tag {
        BroadcastTag::Everyone => true,
        BroadcastTag::Coaches => user.role == Role::Coach,
        BroadcastTag::Members => user.role == Role::Member,
    }
}
