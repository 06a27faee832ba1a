//! WebSocket listener handling.
//!
//! # Responsibilities
//! - Complete the upgrade handshake and register the connection as a listener
//! - Forward broadcast snapshots to the socket as text frames
//! - Remove the listener on close, read failure or write failure
//!
//! # Data Flow
//! ```text
//! Fanout ── Arc<str> ──→ bounded channel ──→ writer task ──→ socket
//! socket ──→ read loop (close frames end the connection, others ignored)
//! ```
//!
//! # Design Decisions
//! - One writer task per listener; broadcasts never await a socket
//! - Removing the listener drops its channel sender, which ends the writer
//! - Every socket write is time-limited, so a client that stops reading
//!   cannot pin its task

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::broadcast::{listener_channel, Fanout, ListenerId};
use crate::http::server::AppState;

/// Longest a single snapshot write may take before the listener is dropped.
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long to wait for the writer to hand the socket back for closing.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

type Sink = SplitSink<WebSocket, Message>;

/// Upgrade handler for the real-time endpoint.
pub async fn upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let fanout = state.fanout.clone();
    ws.on_upgrade(move |socket| serve_listener(socket, fanout))
}

enum ReadOutcome {
    Closed,
    Failed(axum::Error),
}

/// Drive one listener connection until it ends.
pub async fn serve_listener(socket: WebSocket, fanout: Arc<Fanout>) {
    let (sink, mut stream) = socket.split();
    let (tx, rx) = listener_channel();
    let id = fanout.accept(tx);
    tracing::info!(listener_id = %id, listeners = fanout.len(), "Listener connected");

    let mut writer = tokio::spawn(write_snapshots(sink, rx, id, fanout.clone()));

    let ended = tokio::select! {
        outcome = read_until_closed(&mut stream) => Some(outcome),
        _ = &mut writer => None,
    };

    match ended {
        Some(ReadOutcome::Closed) => {
            fanout.remove(id);
            tracing::info!(listener_id = %id, "Listener disconnected");
            // Completes the close handshake with the client.
            if let Some(mut sink) = reclaim_sink(writer, id).await {
                match tokio::time::timeout(CLOSE_GRACE, sink.close()).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(listener_id = %id, error = %e, "Close reply not delivered")
                    }
                    Err(_) => tracing::debug!(listener_id = %id, "Close reply timed out"),
                }
            }
        }
        Some(ReadOutcome::Failed(e)) => {
            fanout.remove(id);
            tracing::warn!(listener_id = %id, error = %e, "Listener read failed");
            if let Some(mut sink) = reclaim_sink(writer, id).await {
                let frame = CloseFrame {
                    code: close_code::NORMAL,
                    reason: "".into(),
                };
                let sent = tokio::time::timeout(CLOSE_GRACE, sink.send(Message::Close(Some(frame))));
                match sent.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(listener_id = %id, error = %e, "Close frame not delivered")
                    }
                    Err(_) => tracing::debug!(listener_id = %id, "Close frame timed out"),
                }
            }
        }
        // The writer only stops on its own after a failed send, and has
        // already removed the listener.
        None => tracing::info!(listener_id = %id, "Listener dropped after send failure"),
    }
}

/// Wait for the writer to finish and return its socket half. The listener
/// must already be removed, so the writer's channel is closed.
async fn reclaim_sink(mut writer: JoinHandle<Sink>, id: ListenerId) -> Option<Sink> {
    match tokio::time::timeout(CLOSE_GRACE, &mut writer).await {
        Ok(Ok(sink)) => Some(sink),
        Ok(Err(e)) => {
            tracing::debug!(listener_id = %id, error = %e, "Writer task failed");
            None
        }
        Err(_) => {
            writer.abort();
            tracing::debug!(listener_id = %id, "Writer did not stop in time, aborted");
            None
        }
    }
}

async fn read_until_closed(stream: &mut SplitStream<WebSocket>) -> ReadOutcome {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(_)) => return ReadOutcome::Closed,
            Ok(_) => {}
            Err(e) => return ReadOutcome::Failed(e),
        }
    }
    ReadOutcome::Closed
}

async fn write_snapshots(
    mut sink: Sink,
    mut rx: mpsc::Receiver<Arc<str>>,
    id: ListenerId,
    fanout: Arc<Fanout>,
) -> Sink {
    while let Some(snapshot) = rx.recv().await {
        let frame = Message::Text(snapshot.as_ref().into());
        match tokio::time::timeout(WRITE_TIMEOUT, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(listener_id = %id, error = %e, "Snapshot send failed, removing listener");
                fanout.remove(id);
                break;
            }
            Err(_) => {
                tracing::warn!(listener_id = %id, "Snapshot send timed out, removing listener");
                fanout.remove(id);
                break;
            }
        }
    }
    sink
}
