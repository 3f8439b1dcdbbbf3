//! WebSocket streaming of tick snapshots.
use crate::state::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

/// Handler for WebSocket connections.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
        .into_response()
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let mut rx = state.tx.subscribe();

    // Current snapshot first so clients don't wait for the next tick.
    match serde_json::to_string(state.latest_snapshot().as_ref()) {
        Ok(payload) => {
            if socket.send(Message::Text(payload)).await.is_err() {
                return;
            }
        }
        Err(e) => tracing::error!("Failed to serialize snapshot: {}", e),
    }

    loop {
        let outgoing = tokio::select! {
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Ping(payload))) => Message::Pong(payload),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => continue,
            },
            published = rx.recv() => match published {
                Ok(payload) => Message::Text(payload.as_ref().to_owned()),
                // Each snapshot is complete, so a slow client only needs the newest.
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Stream client skipped {} snapshots", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
        };

        if socket.send(outgoing).await.is_err() {
            break;
        }
    }
}
