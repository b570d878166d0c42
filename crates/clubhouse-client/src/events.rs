use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use clubhouse_shared::protocol::RealtimeEvent;
use clubhouse_shared::ProtocolError;

pub const EVENT_INBOX_UPDATED: &str = "inbox-updated";

/// One event as delivered by the realtime transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeFrame {
    pub event: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl RealtimeFrame {
    pub fn new(event: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// `Ok(None)` for events unrelated to messaging.
    pub fn decode(self) -> Result<Option<RealtimeEvent>, ProtocolError> {
        RealtimeEvent::from_value(&self.event, self.payload)
    }
}

/// Sent to the UI whenever a realtime event changed a conversation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InboxUpdatedPayload {
    pub conversation_id: String,
    pub unread_count: usize,
    pub total_unread: usize,
}

pub fn emit_update(tx: &mpsc::Sender<InboxUpdatedPayload>, payload: InboxUpdatedPayload) {
    if let Err(e) = tx.try_send(payload) {
        tracing::error!(event = EVENT_INBOX_UPDATED, error = %e, "Failed to emit event");
    }
}
