//! Canonical identity of a two-party conversation.

use serde::{Deserialize, Serialize};

use clubhouse_shared::constants::CONVERSATION_KEY_SEPARATOR;
use clubhouse_shared::UserId;

/// `"{low}_{high}"` for the two participant ids, ordered numerically.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ConversationKey(String);

impl ConversationKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for ConversationKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The two ids in ascending order.
pub fn ordered_pair(a: UserId, b: UserId) -> [UserId; 2] {
    if a <= b {
        [a, b]
    } else {
        [b, a]
    }
}

/// Build the key for the unordered pair `{a, b}`.
///
/// Every conversation id in the workspace comes from here.
pub fn conversation_key(a: UserId, b: UserId) -> ConversationKey {
    let [low, high] = ordered_pair(a, b);
    ConversationKey(format!("{low}{CONVERSATION_KEY_SEPARATOR}{high}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_symmetric() {
        assert_eq!(conversation_key(UserId(1), UserId(2)), conversation_key(UserId(2), UserId(1)));
        assert_eq!(conversation_key(UserId(2), UserId(1)), "1_2");
    }

    #[test]
    fn test_key_orders_numerically() {
        // A lexicographic sort would give "10_9".
        assert_eq!(conversation_key(UserId(10), UserId(9)), "9_10");
    }

    #[test]
    fn test_self_conversation() {
        assert_eq!(conversation_key(UserId(4), UserId(4)), "4_4");
    }
}
