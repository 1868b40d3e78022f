//! WebSocket upgrade handler for booking conversations.
//!
//! Handles the HTTP → WebSocket upgrade and the connection lifecycle:
//! 1. Upgrade to WebSocket and announce the connection
//! 2. For each text frame: validate fields, verify the token, run the turn
//! 3. Send the reply (or error) back on the same socket
//! 4. Stop on close or receive error
//!
//! Frames on one connection are processed in order. Each turn runs on its
//! own task so a client disconnect never cancels a turn halfway.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};

use crate::application::{ProcessTurnCommand, ProcessTurnHandler};
use crate::domain::foundation::{ConnectionId, ErrorCode};
use crate::ports::TokenVerifier;

use super::messages::{ClientFrame, ServerMessage, MISSING_FIELDS};

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    /// Conversation engine.
    pub turns: Arc<ProcessTurnHandler>,
    /// Checks the token carried by every frame.
    pub tokens: Arc<dyn TokenVerifier>,
}

impl WebSocketState {
    /// Create a new WebSocket state.
    pub fn new(turns: Arc<ProcessTurnHandler>, tokens: Arc<dyn TokenVerifier>) -> Self {
        Self { turns, tokens }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established WebSocket connection.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (mut sender, mut receiver) = socket.split();
    let connection_id = ConnectionId::new();

    tracing::info!(connection_id = %connection_id, "WebSocket connected");

    if let Err(e) = send_message(&mut sender, &ServerMessage::connected(connection_id)).await {
        tracing::debug!(connection_id = %connection_id, "Failed to send connected message: {}", e);
        return;
    }

    while let Some(result) = receiver.next().await {
        let reply = match result {
            Ok(Message::Text(text)) => {
                let state = state.clone();
                let turn = tokio::spawn(async move { process_frame(&state, &text).await });
                match turn.await {
                    Ok(reply) => reply,
                    Err(e) => {
                        tracing::error!(connection_id = %connection_id, "Turn task failed: {}", e);
                        ServerMessage::error(ErrorCode::InternalError, "Internal error", None)
                    }
                }
            }
            Ok(Message::Binary(_)) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    "Received unsupported binary message"
                );
                ServerMessage::error(
                    ErrorCode::InvalidFormat,
                    "Binary frames are not supported",
                    None,
                )
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                // Protocol-level keepalive, answered by axum
                continue;
            }
            Ok(Message::Close(_)) => {
                tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                break;
            }
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                break;
            }
        };

        if let Err(e) = send_message(&mut sender, &reply).await {
            tracing::debug!(
                connection_id = %connection_id,
                "Send error, closing connection: {}",
                e
            );
            break;
        }
    }

    tracing::info!(connection_id = %connection_id, "WebSocket disconnected");
}

/// Turns one inbound text frame into the message to send back.
///
/// Never fails: malformed frames, rejected tokens and failed turns all
/// become [`ServerMessage::Error`] and the connection stays usable.
pub async fn process_frame(state: &WebSocketState, text: &str) -> ServerMessage {
    let frame = match serde_json::from_str::<ClientFrame>(text) {
        Ok(frame) => frame,
        Err(e) => {
            return ServerMessage::error(
                ErrorCode::InvalidFormat,
                format!("Malformed frame: {}", e),
                None,
            )
        }
    };

    let Some(frame) = frame.complete() else {
        return ServerMessage::error(ErrorCode::ValidationFailed, MISSING_FIELDS, None);
    };

    let cmd = match ProcessTurnCommand::new(frame.thread_id.as_str(), frame.message) {
        Ok(cmd) => cmd,
        Err(e) => return ServerMessage::turn_failed(&e, &frame.thread_id),
    };

    if let Err(e) = state.tokens.verify(&cmd.thread_id, &frame.token).await {
        return ServerMessage::error(
            ErrorCode::Unauthorized,
            e.to_string(),
            Some(frame.thread_id),
        );
    }

    match state.turns.handle(cmd).await {
        Ok(reply) => ServerMessage::reply(&reply),
        Err(e) => {
            tracing::warn!(
                thread_id = %frame.thread_id,
                code = %e.code(),
                retryable = e.is_retryable(),
                "Turn failed: {}",
                e
            );
            ServerMessage::turn_failed(&e, &frame.thread_id)
        }
    }
}

/// Send a JSON message over the WebSocket.
async fn send_message(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMessage,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(msg).map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}

/// Create axum router for the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
