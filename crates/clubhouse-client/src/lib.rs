//! Inbox client for the club messaging backend.
//!
//! Wraps the pure conversation logic of `clubhouse-inbox` with the REST
//! transport, realtime event handling and configuration.

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod events;
pub mod session;

pub use api::{HttpMessageApi, MessageApi};
pub use bridge::spawn_realtime_bridge;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use events::{InboxUpdatedPayload, RealtimeFrame};
pub use session::{InboxSession, LoadState};

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global tracing subscriber. Respects `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clubhouse_client=debug,clubhouse_inbox=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
