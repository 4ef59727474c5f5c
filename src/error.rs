//! Error types surfaced to HTTP and WebSocket clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum GameError {
    #[error("room {0} not found")]
    RoomNotFound(String),

    #[error("room {code} is full ({max} players maximum)")]
    RoomFull { code: String, max: usize },

    #[error("a room code is required")]
    MissingRoomCode,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl GameError {
    /// Machine-readable code used in `ServerMessage::Error`
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound(_) => "ROOM_NOT_FOUND",
            GameError::RoomFull { .. } => "ROOM_FULL",
            GameError::MissingRoomCode => "MISSING_ROOM_CODE",
            GameError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GameError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            GameError::RoomFull { .. } => StatusCode::CONFLICT,
            GameError::MissingRoomCode | GameError::InvalidConfig(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for GameError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
