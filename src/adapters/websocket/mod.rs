//! WebSocket transport for booking conversations.
//!
//! # Components
//!
//! - [`messages`] - Frame types exchanged with clients
//! - [`handler`] - Axum WebSocket upgrade handler and per-frame processing

pub mod handler;
pub mod messages;

pub use handler::{process_frame, websocket_router, ws_handler, WebSocketState};
pub use messages::{
    ClientFrame, ConnectedMessage, ErrorMessage, ReplyMessage, ServerMessage, TurnFrame,
    MISSING_FIELDS,
};
