use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::MessageApi;
use crate::events::{emit_update, InboxUpdatedPayload, RealtimeFrame};
use crate::session::InboxSession;

/// Spawn the task that folds realtime frames into `session` and reports
/// each change on `updates`.
pub fn spawn_realtime_bridge<A>(
    session: Arc<Mutex<InboxSession<A>>>,
    frames: mpsc::Receiver<RealtimeFrame>,
    updates: mpsc::Sender<InboxUpdatedPayload>,
) -> JoinHandle<()>
where
    A: MessageApi + 'static,
{
    tokio::spawn(async move {
        realtime_loop(session, frames, updates).await;
    })
}

/// Process frames until the transport closes its sender.
///
/// Frames are applied one at a time under the session lock, in arrival
/// order. Undecodable frames are logged and dropped.
pub async fn realtime_loop<A: MessageApi>(
    session: Arc<Mutex<InboxSession<A>>>,
    mut frames: mpsc::Receiver<RealtimeFrame>,
    updates: mpsc::Sender<InboxUpdatedPayload>,
) {
    info!("Realtime bridge started");

    while let Some(frame) = frames.recv().await {
        let name = frame.event.clone();
        let event = match frame.decode() {
            Ok(Some(event)) => event,
            Ok(None) => {
                debug!(event = %name, "Ignoring non-message event");
                continue;
            }
            Err(e) => {
                warn!(event = %name, error = %e, "Dropping malformed realtime event");
                continue;
            }
        };

        let payload = {
            let mut guard = session.lock().await;
            let Some(key) = guard.apply_event(event) else {
                continue;
            };
            let unread_count = guard.conversation(&key).map_or(0, |c| c.unread_count);
            InboxUpdatedPayload {
                conversation_id: key.to_string(),
                unread_count,
                total_unread: guard.total_unread(),
            }
        };

        debug!(conversation = %payload.conversation_id, unread = payload.unread_count, "Conversation updated");
        emit_update(&updates, payload);
    }

    warn!("Realtime bridge ended");
}
