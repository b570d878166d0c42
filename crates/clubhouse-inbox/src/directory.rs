//! Read-only user lookup used to decorate conversations with names and
//! roles. The directory never decides identity or ownership.

use std::collections::HashMap;

use clubhouse_shared::constants::placeholder_name;
use clubhouse_shared::{Role, User, UserId};

#[derive(Debug, Clone, Default)]
pub struct Directory {
    users: Vec<User>,
    index: HashMap<UserId, usize>,
}

impl Directory {
    pub fn new(users: Vec<User>) -> Self {
        let mut index = HashMap::with_capacity(users.len());
        for (i, user) in users.iter().enumerate() {
            // First entry wins when the roster repeats an id.
            index.entry(user.id).or_insert(i);
        }
        Self { users, index }
    }

    pub fn get(&self, id: UserId) -> Option<&User> {
        self.index.get(&id).map(|&i| &self.users[i])
    }

    /// Directory name, or `"User {id}"` for unknown ids.
    pub fn display_name(&self, id: UserId) -> String {
        self.get(id)
            .map(|u| u.display_name.clone())
            .unwrap_or_else(|| placeholder_name(id.0))
    }

    /// Directory role, or [`Role::User`] for unknown ids.
    pub fn role(&self, id: UserId) -> Role {
        self.get(id).map(|u| u.role).unwrap_or_default()
    }

    /// Users in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl FromIterator<User> for Directory {
    fn from_iter<I: IntoIterator<Item = User>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
