use super::Room;
use crate::config::ServerConfig;
use crate::error::GameError;
use crate::store::{ScoreStore, ScoreWriter};
use crate::types::*;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Room that always exists and takes connections without a code
pub const DEFAULT_ROOM_CODE: &str = "CLASSIC";

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

pub fn normalize_room_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// All live rooms keyed by code
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomCode, Arc<Room>>>,
    config: Arc<ServerConfig>,
    scores: ScoreWriter,
}

impl RoomRegistry {
    /// Must be called inside a tokio runtime: it starts the score writer
    pub fn new(config: Arc<ServerConfig>, store: Arc<dyn ScoreStore>) -> Self {
        let scores = ScoreWriter::spawn(store);
        let default_room = Room::new(
            DEFAULT_ROOM_CODE.to_string(),
            config.game.clone(),
            config.max_players,
            scores.clone(),
        );
        Self {
            rooms: RwLock::new(HashMap::from([(DEFAULT_ROOM_CODE.to_string(), default_room)])),
            config,
            scores,
        }
    }

    /// Create a room starting from the server defaults plus `overrides`
    pub async fn create_room(&self, overrides: &ConfigUpdate) -> Result<Arc<Room>, GameError> {
        if let Some(categories) = &overrides.categories {
            if sanitize_categories(categories).is_empty() {
                return Err(GameError::InvalidConfig(
                    "at least one category is required".to_string(),
                ));
            }
        }
        let mut game = self.config.game.clone();
        game.apply(overrides);

        let mut rooms = self.rooms.write().await;
        // Collisions are retried (24M combinations)
        let code = loop {
            let code = generate_room_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };
        let room = Room::new(code.clone(), game, self.config.max_players, self.scores.clone());
        rooms.insert(code.clone(), room.clone());
        tracing::info!(room = %code, "Room created");
        Ok(room)
    }

    pub async fn get(&self, code: &str) -> Option<Arc<Room>> {
        self.rooms
            .read()
            .await
            .get(&normalize_room_code(code))
            .cloned()
    }

    /// Room for a join attempt: must be named, exist and have a free slot
    pub async fn get_for_join(&self, code: &str) -> Result<Arc<Room>, GameError> {
        let code = normalize_room_code(code);
        if code.is_empty() {
            return Err(GameError::MissingRoomCode);
        }
        let room = self
            .get(&code)
            .await
            .ok_or_else(|| GameError::RoomNotFound(code.clone()))?;
        if !room.has_space().await {
            return Err(GameError::RoomFull {
                code,
                max: room.max_players(),
            });
        }
        Ok(room)
    }

    /// Room for a WebSocket connection; no code means the default room
    pub async fn resolve(&self, code: Option<&str>) -> Result<Arc<Room>, GameError> {
        let code = code.map(normalize_room_code).unwrap_or_default();
        if code.is_empty() {
            return self
                .get(DEFAULT_ROOM_CODE)
                .await
                .ok_or_else(|| GameError::RoomNotFound(DEFAULT_ROOM_CODE.to_string()));
        }
        self.get(&code)
            .await
            .ok_or(GameError::RoomNotFound(code))
    }

    /// Drop a room once its last player is gone. The default room stays.
    pub async fn remove_if_empty(&self, code: &str) -> bool {
        let code = normalize_room_code(code);
        if code == DEFAULT_ROOM_CODE {
            return false;
        }
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get(&code) else {
            return false;
        };
        if !room.close_if_empty().await {
            return false;
        }
        rooms.remove(&code);
        tracing::info!(room = %code, "Room removed");
        true
    }

    /// Wait until queued leaderboards are written
    pub async fn flush_scores(&self) {
        self.scores.flush().await;
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}
