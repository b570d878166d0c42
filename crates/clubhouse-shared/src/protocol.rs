//! JSON shapes exchanged with the club backend, over REST and over the
//! realtime channel.
//!
//! Field names follow the backend's schema (`id_emetteur`, `contenu`, ...);
//! the conversions at the bottom of each section map them onto the domain
//! types in [`crate::types`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    placeholder_name, EVENT_MESSAGE_NEW, EVENT_MESSAGE_SENT, TAG_COACHES, TAG_EVERYONE,
    TAG_MEMBERS,
};
use crate::error::ProtocolError;
use crate::types::{ActivityStatus, Delivery, Message, MessageId, MessageStatus, Role, User, UserId};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// A message row as the backend serializes it.
///
/// Sender and recipient are optional so that a truncated realtime payload
/// still decodes; [`MessageRecord::into_message`] rejects it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageRecord {
    #[serde(rename = "id_message")]
    pub id: Option<i64>,
    #[serde(rename = "id_emetteur")]
    pub sender_id: Option<i64>,
    #[serde(rename = "id_destinataire")]
    pub recipient_id: Option<i64>,
    #[serde(rename = "contenu", default)]
    pub content: String,
    #[serde(rename = "statut", default)]
    pub status: MessageStatus,
    #[serde(default = "default_can_reply")]
    pub can_reply: bool,
    #[serde(rename = "id_messageRepondu", default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
    #[serde(rename = "date_envoi")]
    pub sent_at: DateTime<Utc>,
}

fn default_can_reply() -> bool {
    true
}

impl MessageRecord {
    /// Convert into a confirmed domain message. Returns `None` when the
    /// record lacks its id, sender or recipient.
    pub fn into_message(self) -> Option<Message> {
        Some(Message {
            id: MessageId::Server(self.id?),
            sender_id: UserId(self.sender_id?),
            recipient_id: UserId(self.recipient_id?),
            content: self.content,
            sent_at: self.sent_at,
            status: self.status,
            can_reply: self.can_reply,
            reply_to: self.reply_to,
            delivery: Delivery::Confirmed,
        })
    }
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub id_emetteur: i64,
    pub id_destinataire: i64,
    pub id_destinataires: Vec<i64>,
    pub contenu: String,
    pub statut: MessageStatus,
    pub can_reply: bool,
    #[serde(rename = "id_messageRepondu", skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<i64>,
}

impl SendMessageRequest {
    pub fn new(sender: UserId, recipient: UserId, content: impl Into<String>) -> Self {
        Self {
            id_emetteur: sender.0,
            id_destinataire: recipient.0,
            id_destinataires: vec![recipient.0],
            contenu: content.into(),
            statut: MessageStatus::Sent,
            can_reply: true,
            reply_to: None,
        }
    }

    /// Mark the message as an answer to server message `parent`.
    pub fn replying_to(mut self, parent: i64) -> Self {
        self.reply_to = Some(parent);
        self
    }
}

/// Body of `PUT /messages/{id}` when only the status changes.
#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdateRequest {
    pub statut: MessageStatus,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// A user row as returned by `GET /users`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub nom: Option<String>,
    #[serde(default)]
    pub prenom: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub status: ActivityStatus,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        let display_name = match r.full_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => name,
            None => {
                let parts: Vec<&str> = [r.prenom.as_deref(), r.nom.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|p| !p.trim().is_empty())
                    .collect();
                if parts.is_empty() {
                    placeholder_name(r.id)
                } else {
                    parts.join(" ")
                }
            }
        };

        Self {
            id: UserId(r.id),
            display_name,
            email: r.email,
            role: r.role,
            activity_status: r.status,
        }
    }
}

// ---------------------------------------------------------------------------
// Realtime events
// ---------------------------------------------------------------------------

/// Events delivered by the realtime channel that concern messaging.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeEvent {
    /// Someone sent the viewer a message.
    MessageNew(MessageRecord),
    /// The backend acknowledged a message the viewer sent.
    MessageSent(MessageRecord),
}

impl RealtimeEvent {
    /// Decode an event by name. Event names unrelated to messaging yield
    /// `Ok(None)`.
    pub fn from_value(name: &str, payload: serde_json::Value) -> Result<Option<Self>, ProtocolError> {
        let event = match name {
            EVENT_MESSAGE_NEW => Self::MessageNew(serde_json::from_value(payload)?),
            EVENT_MESSAGE_SENT => Self::MessageSent(serde_json::from_value(payload)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MessageNew(_) => EVENT_MESSAGE_NEW,
            Self::MessageSent(_) => EVENT_MESSAGE_SENT,
        }
    }

    /// Both event kinds carry a message record and are handled alike.
    pub fn into_record(self) -> MessageRecord {
        match self {
            Self::MessageNew(r) | Self::MessageSent(r) => r,
        }
    }
}

// ---------------------------------------------------------------------------
// Broadcast recipients
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BroadcastTag {
    /// Every active user except the sender.
    Everyone,
    /// Every active coach.
    Coaches,
    /// Every active member.
    Members,
}

impl BroadcastTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Everyone => TAG_EVERYONE,
            Self::Coaches => TAG_COACHES,
            Self::Members => TAG_MEMBERS,
        }
    }
}

impl std::str::FromStr for BroadcastTag {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            TAG_EVERYONE => Ok(Self::Everyone),
            TAG_COACHES => Ok(Self::Coaches),
            TAG_MEMBERS => Ok(Self::Members),
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }
}

/// Target of a broadcast: a single user or a tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Recipient {
    User(UserId),
    Tag(BroadcastTag),
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECORD: &str = r#"{
        "id_message": 7,
        "id_emetteur": 2,
        "id_destinataire": 1,
        "contenu": "Training moved to 18:00",
        "statut": "sent",
        "can_reply": true,
        "date_envoi": "2024-03-01T17:30:00.000Z"
    }"#;

    #[test]
    fn test_decode_backend_message() {
        let record: MessageRecord = serde_json::from_str(RECORD).unwrap();
        let msg = record.into_message().expect("complete record");
        assert_eq!(msg.id, MessageId::Server(7));
        assert_eq!(msg.sender_id, UserId(2));
        assert_eq!(msg.recipient_id, UserId(1));
        assert_eq!(msg.status, MessageStatus::Sent);
        assert_eq!(msg.delivery, Delivery::Confirmed);
    }

    #[test]
    fn test_record_missing_sender_is_rejected() {
        let payload = r#"{"id_message": 3, "id_destinataire": 1, "date_envoi": "2024-03-01T17:30:00Z"}"#;
        let record: MessageRecord = serde_json::from_str(payload).unwrap();
        assert!(record.into_message().is_none());
    }

    #[test]
    fn test_realtime_decode() {
        let payload: serde_json::Value = serde_json::from_str(RECORD).unwrap();
        let event = RealtimeEvent::from_value(EVENT_MESSAGE_SENT, payload).unwrap().unwrap();
        assert_eq!(event.name(), EVENT_MESSAGE_SENT);
        assert_eq!(event.into_record().id, Some(7));

        assert!(RealtimeEvent::from_value("presence:update", serde_json::json!({})).unwrap().is_none());
        assert!(RealtimeEvent::from_value(EVENT_MESSAGE_NEW, serde_json::json!("not a record")).is_err());
    }

    #[test]
    fn test_user_record_name_fallbacks() {
        let full: User = serde_json::from_str::<UserRecord>(
            r#"{"id": 2, "fullName": "Coach X", "role": "COACH", "status": "ACTIVE"}"#,
        )
        .unwrap()
        .into();
        assert_eq!(full.display_name, "Coach X");
        assert_eq!(full.role, Role::Coach);

        let split: User = serde_json::from_str::<UserRecord>(
            r#"{"id": 5, "nom": "Diallo", "prenom": "Awa", "role": "MEMBER", "status": "INACTIVE"}"#,
        )
        .unwrap()
        .into();
        assert_eq!(split.display_name, "Awa Diallo");
        assert!(!split.is_active());

        let bare: User = serde_json::from_str::<UserRecord>(r#"{"id": 9}"#).unwrap().into();
        assert_eq!(bare.display_name, "User 9");
        assert_eq!(bare.role, Role::User);
    }

    #[test]
    fn test_broadcast_tag_parse() {
        assert_eq!("@coaches".parse::<BroadcastTag>().unwrap(), BroadcastTag::Coaches);
        assert!("@staff".parse::<BroadcastTag>().is_err());
    }

    #[test]
    fn test_send_request_shape() {
        let body = serde_json::to_value(SendMessageRequest::new(UserId(1), UserId(2), "hello")).unwrap();
        assert_eq!(body["id_emetteur"], 1);
        assert_eq!(body["id_destinataires"], serde_json::json!([2]));
        assert_eq!(body["contenu"], "hello");
        assert_eq!(body["statut"], "sent");
        assert_eq!(body["can_reply"], true);
        assert!(body.get("id_messageRepondu").is_none());
    }

    #[test]
    fn test_reply_request_carries_parent() {
        let body = serde_json::to_value(SendMessageRequest::new(UserId(3), UserId(2), "ok").replying_to(7)).unwrap();
        assert_eq!(body["id_messageRepondu"], 7);
        assert_eq!(body["id_destinataires"], serde_json::json!([2]));
    }
}
