use chrono::{DateTime, TimeZone, Utc};

use clubhouse_shared::{ActivityStatus, Delivery, Message, MessageId, MessageStatus, Role, User, UserId};

use crate::directory::Directory;

pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Confirmed, unseen message `id` sent at `secs` past the epoch.
pub fn msg(id: i64, sender: i64, recipient: i64, secs: i64) -> Message {
    Message {
        id: MessageId::Server(id),
        sender_id: UserId(sender),
        recipient_id: UserId(recipient),
        content: format!("m{id}"),
        sent_at: ts(secs),
        status: MessageStatus::Sent,
        can_reply: true,
        reply_to: None,
        delivery: Delivery::Confirmed,
    }
}

pub fn user(id: i64, name: &str, role: Role, status: ActivityStatus) -> User {
    User {
        id: UserId(id),
        display_name: name.to_string(),
        email: Some(format!("{}@club.test", name.to_lowercase().replace(' ', "."))),
        role,
        activity_status: status,
    }
}

/// Admin 1, coaches 2 and 5 (5 inactive), members 3 and 4.
pub fn directory() -> Directory {
    Directory::new(vec![
        user(1, "Admin", Role::Admin, ActivityStatus::Active),
        user(2, "Coach X", Role::Coach, ActivityStatus::Active),
        user(3, "Member M", Role::Member, ActivityStatus::Active),
        user(4, "Member N", Role::Member, ActivityStatus::Active),
        user(5, "Coach Y", Role::Coach, ActivityStatus::Inactive),
    ])
}
