use thiserror::Error;

use clubhouse_inbox::ConversationKey;
use clubhouse_shared::{Message, MessageId, ProtocolError, UserId};

/// Errors produced by the client layer.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level HTTP failure (connect, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    /// A payload did not match the expected wire format.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The backend returned a message record without sender or recipient.
    #[error("Incomplete message record from backend")]
    IncompleteRecord,

    #[error("Unknown conversation: {0}")]
    UnknownConversation(ConversationKey),

    #[error("Unknown local message: {0}")]
    UnknownMessage(MessageId),

    #[error("Message content is empty")]
    EmptyContent,

    #[error("No recipients resolved for broadcast")]
    NoRecipients,

    /// Some broadcast sends failed. The ones in `sent` were persisted and
    /// merged into the session.
    #[error("Broadcast failed for {} recipients", .failed.len())]
    PartialBroadcast { sent: Vec<Message>, failed: Vec<UserId> },

    #[error("Message {0} does not accept replies")]
    ReplyNotAllowed(i64),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ClientError>;
