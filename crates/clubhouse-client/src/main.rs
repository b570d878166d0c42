//! # clubhouse-inbox
//!
//! Loads the signed-in user's inbox from the club backend and prints the
//! conversation list as JSON.
//!
//! With `--follow`, realtime frames are then read from stdin, one JSON
//! object per line (`{"event": "message:new", "payload": {...}}`), and an
//! `inbox-updated` line is printed for every conversation they change.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use clubhouse_client::{
    init_tracing, spawn_realtime_bridge, ClientConfig, HttpMessageApi, InboxSession, RealtimeFrame,
};
use clubhouse_shared::constants::REALTIME_CHANNEL_CAPACITY;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let follow = std::env::args().skip(1).any(|arg| arg == "--follow");

    let config = ClientConfig::from_env();
    info!(?config, "Loaded configuration");

    let viewer = config
        .viewer_id
        .ok_or_else(|| anyhow!("CLUBHOUSE_VIEWER_ID must be set"))?;
    let api = HttpMessageApi::new(&config)?;

    let mut session = InboxSession::new(api, viewer);
    session.load().await.context("loading inbox")?;
    println!("{}", serde_json::to_string_pretty(session.conversations())?);

    if !follow {
        return Ok(());
    }

    let session = Arc::new(Mutex::new(session));
    let (frame_tx, frame_rx) = mpsc::channel(REALTIME_CHANNEL_CAPACITY);
    let (update_tx, mut update_rx) = mpsc::channel(REALTIME_CHANNEL_CAPACITY);
    let bridge = spawn_realtime_bridge(session, frame_rx, update_tx);

    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read stdin");
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<RealtimeFrame>(&line) {
                Ok(frame) => {
                    if frame_tx.send(frame).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!(error = %e, "Skipping unparsable frame"),
            }
        }
    });

    while let Some(update) = update_rx.recv().await {
        println!("{}", serde_json::to_string(&update)?);
    }

    reader.await?;
    bridge.await?;
    Ok(())
}
