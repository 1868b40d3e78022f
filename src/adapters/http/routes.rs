//! HTTP surface: service banner, health check and the WebSocket endpoint.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::adapters::websocket::{websocket_router, WebSocketState};

/// Banner returned by `GET /`.
pub const SERVICE_BANNER: &str =
    "Medical appointment booking service. Connect to /ws via WebSocket.";

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub slots: usize,
}

async fn banner() -> Json<BannerResponse> {
    Json(BannerResponse {
        message: SERVICE_BANNER,
    })
}

async fn health(State(state): State<WebSocketState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        slots: state.turns.registry().len(),
    })
}

/// Builds the full application router.
///
/// # Example
///
/// ```ignore
/// let app = app_router(WebSocketState::new(turns, tokens));
/// axum::serve(listener, app).await?;
/// ```
pub fn app_router(state: WebSocketState) -> Router {
    Router::new()
        .route("/", get(banner))
        .route("/health", get(health))
        .merge(websocket_router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
