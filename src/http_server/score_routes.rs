//! Scoreboard endpoints
//!
//! `GET /api/scores` and `GET /api/load` for polling clients, and `GET /ws`
//! for live editors and viewers.

use std::sync::Arc;

use axum::{
    extract::{ws::WebSocketUpgrade, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;

use crate::engine::Scoreboard;
use crate::load::EchoReply;
use crate::realtime::run_session;
use crate::record::Snapshot;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// `/scores` and `/load`, nested under `/api`
pub fn api_routes(state: Arc<Scoreboard>) -> Router {
    Router::new()
        .route("/scores", get(scores_handler))
        .route("/load", get(load_handler))
        .with_state(state)
}

/// `/ws` at the root
pub fn websocket_routes(state: Arc<Scoreboard>) -> Router {
    Router::new()
        .route("/ws", get(websocket_handler))
        .with_state(state)
}

/// Current ranked snapshot
async fn scores_handler(
    State(state): State<Arc<Scoreboard>>,
) -> Result<Json<Snapshot>, (StatusCode, Json<ErrorResponse>)> {
    state.snapshot().map(Json).map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: e.to_string(),
                code: e.code().to_string(),
            }),
        )
    })
}

async fn load_handler(State(state): State<Arc<Scoreboard>>) -> Json<EchoReply> {
    Json(state.echo())
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<Scoreboard>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| run_session(socket, state))
}
