//! HTTP API endpoints for room management.
//!
//! The web client uses these to create rooms, check a code before opening
//! a WebSocket, and reconfigure a room between games.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::GameError;
use crate::protocol::RoomSnapshot;
use crate::state::AppState;
use crate::types::ConfigUpdate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub status: String,
    pub code: String,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/join", post(join_room))
        .route("/api/rooms/{code}", get(get_room))
        .route("/api/rooms/{code}/config", post(configure_room))
}

/// Create a room.
///
/// POST /api/rooms
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(overrides): Json<ConfigUpdate>,
) -> Result<Json<CreateRoomResponse>, GameError> {
    let room = state.rooms.create_room(&overrides).await?;
    Ok(Json(CreateRoomResponse {
        code: room.code().to_string(),
    }))
}

/// Check that a room exists and has a free slot.
///
/// POST /api/rooms/join
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, GameError> {
    let room = state.rooms.get_for_join(&req.code).await?;
    Ok(Json(JoinResponse {
        status: "ok".to_string(),
        code: room.code().to_string(),
    }))
}

/// GET /api/rooms/{code}
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Result<Json<RoomSnapshot>, GameError> {
    let room = state
        .rooms
        .get(&code)
        .await
        .ok_or(GameError::RoomNotFound(code))?;
    Ok(Json(room.snapshot().await))
}

/// Apply new settings and restart the game from round one.
///
/// POST /api/rooms/{code}/config
pub async fn configure_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<RoomSnapshot>, GameError> {
    let room = state
        .rooms
        .get(&code)
        .await
        .ok_or(GameError::RoomNotFound(code))?;
    tracing::info!(room = %room.code(), "Reconfiguring room: {:?}", update);
    room.reconfigure(&update).await;
    Ok(Json(room.snapshot().await))
}
