//! WebSocket message types for booking conversations.
//!
//! Defines the protocol between server and connected clients:
//! - Client → Server: `{thread_id, token, message}` frames, one per turn
//! - Server → Client: connection status, turn replies, errors

use serde::{Deserialize, Serialize};

use crate::application::{ProcessTurnError, TurnOutcome, TurnReply};
use crate::domain::conversation::BookingPhase;
use crate::domain::foundation::{ErrorCode, Timestamp};

/// Error text for frames lacking a required field.
pub const MISSING_FIELDS: &str = "Missing thread_id, token or message";

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be sent from server to client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established successfully.
    Connected(ConnectedMessage),

    /// The engine's reply to one turn.
    Reply(ReplyMessage),

    /// The frame or turn failed.
    Error(ErrorMessage),
}

/// Sent once when the socket is upgraded.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedMessage {
    pub connection_id: String,
    pub timestamp: String,
}

/// Reply to a processed turn.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyMessage {
    pub thread_id: String,
    pub message: String,
    pub phase: BookingPhase,
    pub outcome: TurnOutcome,
    pub timestamp: String,
}

/// Error message sent to client.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorMessage {
    pub code: String,
    pub message: String,
    /// True if resending the same frame may succeed.
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    pub timestamp: String,
}

impl ServerMessage {
    pub fn connected(connection_id: impl ToString) -> Self {
        ServerMessage::Connected(ConnectedMessage {
            connection_id: connection_id.to_string(),
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn reply(reply: &TurnReply) -> Self {
        ServerMessage::Reply(ReplyMessage {
            thread_id: reply.thread_id.to_string(),
            message: reply.message.clone(),
            phase: reply.phase,
            outcome: reply.outcome,
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn error(code: ErrorCode, message: impl Into<String>, thread_id: Option<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            code: code.to_string(),
            message: message.into(),
            retryable: code.is_retryable(),
            thread_id,
            timestamp: Timestamp::now().to_rfc3339(),
        })
    }

    pub fn turn_failed(err: &ProcessTurnError, thread_id: &str) -> Self {
        Self::error(err.code(), err.to_string(), Some(thread_id.to_string()))
    }
}

// ============================================
// Client → Server Messages
// ============================================

/// One inbound turn. Every field is required; they are optional here so a
/// partial frame can be answered with a precise error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientFrame {
    pub thread_id: Option<String>,
    pub token: Option<String>,
    pub message: Option<String>,
}

/// A frame with every required field present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnFrame {
    pub thread_id: String,
    pub token: String,
    pub message: String,
}

impl ClientFrame {
    /// Returns the complete frame, or `None` if any field is missing.
    pub fn complete(self) -> Option<TurnFrame> {
        match (self.thread_id, self.token, self.message) {
            (Some(thread_id), Some(token), Some(message)) => Some(TurnFrame {
                thread_id,
                token,
                message,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_frame_parses() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"thread_id":"t","token":"k","message":"Central"}"#).unwrap();
        let frame = frame.complete().unwrap();
        assert_eq!(frame.message, "Central");
    }

    #[test]
    fn partial_frame_is_incomplete() {
        let frame: ClientFrame = serde_json::from_str(r#"{"thread_id":"t"}"#).unwrap();
        assert!(frame.complete().is_none());
    }

    #[test]
    fn error_serializes_with_type_tag() {
        let msg = ServerMessage::error(ErrorCode::LookupTimeout, "slow", Some("t".into()));
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "LOOKUP_TIMEOUT");
        assert_eq!(json["retryable"], true);
        assert_eq!(json["thread_id"], "t");
    }

    #[test]
    fn error_omits_missing_thread_id() {
        let msg = ServerMessage::error(ErrorCode::ValidationFailed, MISSING_FIELDS, None);
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert!(json.get("thread_id").is_none());
        assert_eq!(json["retryable"], false);
    }
}
