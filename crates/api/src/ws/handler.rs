//! WebSocket upgrade handler and per-connection socket pump.
//!
//! A connecting client presents its access token as a query parameter; the
//! identity is resolved before the upgrade completes, so an unauthenticated
//! connection is refused with 401 at the handshake and never reaches the
//! hub.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use atelier_core::error::CoreError;
use atelier_core::user::UserIdentity;

use crate::error::ApiError;
use crate::state::AppState;
use crate::ws::protocol::{ack_frame, ClientFrame};
use crate::ws::session::RealtimeSession;

/// Handshake query parameters.
#[derive(Debug, Deserialize)]
pub struct WsParams {
    token: Option<String>,
}

/// HTTP handler that authenticates the handshake and upgrades to WebSocket.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let token = params.token.ok_or_else(|| {
        ApiError::Core(CoreError::Unauthorized(
            "Missing authentication token".into(),
        ))
    })?;
    let user = state.identity.resolve(&token).await?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with the room registry.
///   2. Spawns a sender task forwarding channel messages to the sink.
///   3. Dispatches inbound frames through the hub on the current task.
///   4. Cleans up on disconnect (implicit leave of every joined room).
async fn handle_socket(socket: WebSocket, state: AppState, user: UserIdentity) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    tracing::info!(conn_id = %conn_id, user_id = %user.id, "WebSocket connected");

    let (tx, mut rx) = mpsc::unbounded_channel();
    state.rooms.connect(conn_id.clone(), tx.clone()).await;
    let mut session = RealtimeSession::new(conn_id.clone(), user, tx);

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
        }
    });

    // Receiver loop: parse and dispatch inbound frames.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let frame: ClientFrame = match serde_json::from_str(&text) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::debug!(conn_id = %conn_id, error = %err, "Unparseable frame");
                        continue;
                    }
                };

                let ack = state.hub.handle(&mut session, frame.event).await;
                // Acks are only delivered when the client asked for one.
                if let (Some(ack_id), Some(ack)) = (frame.ack, ack) {
                    session.send(ack_frame(ack_id, &ack));
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    // Clean up: drop the connection from every room, abort the sender.
    state.rooms.disconnect(&conn_id).await;
    send_task.abort();
    tracing::info!(conn_id = %conn_id, "WebSocket disconnected");
}
