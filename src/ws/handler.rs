//! WebSocket connection handlers.

use super::connection::{OutgoingMessage, WsConnection};
use super::protocol::{self, ClientMessage};
use crate::node::NodeId;
use crate::services::DriveService;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval, Duration, Instant};
use tracing::{debug, error, info, warn};

/// Keep-alive ping interval (30 seconds)
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Timeout for considering a connection dead (90 seconds = 3 missed pings)
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(90);

/// Capacity of each connection's outgoing queue
const OUTGOING_CAPACITY: usize = 64;

/// WebSocket state shared across handlers.
#[derive(Clone)]
pub struct WsState {
    pub service: Arc<DriveService>,
}

/// Handle WebSocket upgrade request for watching a folder.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
    Path(folder_id): Path<NodeId>,
) -> Result<impl IntoResponse, StatusCode> {
    if let Err(e) = state.service.run(move |s| s.folder_info(folder_id)).await {
        debug!(folder_id = %folder_id, "Refusing WebSocket upgrade: {}", e);
        return Err(StatusCode::NOT_FOUND);
    }

    info!(folder_id = %folder_id, "WebSocket upgrade request");

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, folder_id)))
}

/// Handle an established WebSocket connection.
async fn handle_socket(mut socket: WebSocket, state: WsState, folder_id: NodeId) {
    let (tx, mut rx) = mpsc::channel::<OutgoingMessage>(OUTGOING_CAPACITY);

    let conn = WsConnection::new(folder_id, tx);
    let conn_id = conn.id.clone();

    // Registration queues the initial listing
    if let Err(e) = state.service.run(move |s| s.watch(conn)).await {
        warn!(conn_id = %conn_id, folder_id = %folder_id, "Failed to watch folder: {}", e);
        let _ = socket.close().await;
        return;
    }
    info!(conn_id = %conn_id, folder_id = %folder_id, "WebSocket connected");

    let mut current = folder_id;
    let mut last_activity = Instant::now();

    let mut ping_interval = interval(PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            Some(msg) = rx.recv() => {
                let OutgoingMessage::Text(text) = msg;
                if let Err(e) = socket.send(Message::Text(text)).await {
                    debug!(conn_id = %conn_id, "Failed to send WebSocket message: {}", e);
                    break;
                }
            }

            _ = ping_interval.tick() => {
                if last_activity.elapsed() > CONNECTION_TIMEOUT {
                    warn!(conn_id = %conn_id, "Connection timed out (no activity for {:?})", CONNECTION_TIMEOUT);
                    let _ = socket.close().await;
                    break;
                }

                if let Err(e) = socket.send(Message::Ping(vec![])).await {
                    debug!(conn_id = %conn_id, "Failed to send ping: {}", e);
                    break;
                }
            }

            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_activity = Instant::now();
                        handle_text_message(&state, &conn_id, &mut current, &text).await;
                    }
                    Some(Ok(Message::Binary(_))) => {
                        last_activity = Instant::now();
                        debug!(conn_id = %conn_id, "Ignoring binary message");
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        // Pong replies are sent by axum
                        last_activity = Instant::now();
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(conn_id = %conn_id, "Client initiated close");
                        break;
                    }
                    Some(Err(e)) => {
                        error!(conn_id = %conn_id, "WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!(conn_id = %conn_id, "WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    info!(conn_id = %conn_id, folder_id = %current, "WebSocket disconnected");
    let unwatch_id = conn_id.clone();
    if let Err(e) = state
        .service
        .run(move |s| s.unwatch(&unwatch_id, current))
        .await
    {
        debug!(conn_id = %conn_id, "Failed to unwatch folder: {}", e);
    }
}

/// Apply one client text frame. `current` tracks the folder this
/// connection is registered under.
async fn handle_text_message(state: &WsState, conn_id: &str, current: &mut NodeId, text: &str) {
    match protocol::decode_message(text) {
        Ok(ClientMessage::ChangeFolder { id }) => {
            let from = *current;
            let moving = conn_id.to_string();
            let moved = state
                .service
                .run(move |s| s.change_folder(&moving, from, id))
                .await;
            match moved {
                Ok(()) => {
                    debug!(conn_id = %conn_id, from = %current, to = %id, "Changed folder");
                    *current = id;
                }
                Err(e) => warn!(conn_id = %conn_id, to = %id, "Failed to change folder: {}", e),
            }
        }
        Ok(ClientMessage::Other { action }) => {
            debug!(conn_id = %conn_id, action = %action, "Ignoring unknown action");
        }
        Err(e) => warn!(conn_id = %conn_id, "Error handling text message: {}", e),
    }
}
