mod player;
mod registry;
mod room;
mod round;
mod validation;

pub use registry::{normalize_room_code, RoomRegistry, DEFAULT_ROOM_CODE};
pub use room::{PlayerSender, Room, OUTBOUND_QUEUE_SIZE};
pub use round::ClockTick;

use crate::config::ServerConfig;
use crate::store::ScoreStore;
use crate::types::*;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared application state handed to every HTTP and WebSocket handler
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RoomRegistry>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, store: Arc<dyn ScoreStore>) -> Self {
        let config = Arc::new(config);
        Self {
            rooms: Arc::new(RoomRegistry::new(config.clone(), store)),
            config,
        }
    }
}

/// Validation queue plus the cursor pointing at the live entry
#[derive(Debug, Clone, Default)]
pub struct ValidationQueue {
    pub entries: Vec<ValidationEntry>,
    pub cursor: usize,
}

impl ValidationQueue {
    pub fn live(&self) -> Option<&ValidationEntry> {
        self.entries.get(self.cursor)
    }

    pub fn live_mut(&mut self) -> Option<&mut ValidationEntry> {
        self.entries.get_mut(self.cursor)
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    pub fn pending(&self) -> usize {
        self.entries.len().saturating_sub(self.cursor)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}

/// All mutable state of one game room.
///
/// Every method is synchronous and only ever called while the owning
/// [`Room`] holds its lock. Network I/O happens elsewhere.
#[derive(Debug)]
pub struct RoomState {
    pub code: RoomCode,
    pub config: GameConfig,
    pub letter: char,
    pub players: HashMap<PlayerId, Player>,
    pub rounds_played: u32,
    pub phase: Phase,
    pub remaining_seconds: u32,
    pub validation: ValidationQueue,
    /// Outbound queue per connected player
    pub(crate) senders: HashMap<PlayerId, PlayerSender>,
    /// Set once the room left the registry
    pub(crate) closed: bool,
    /// Bumped whenever a round starts or the room is reset; a clock only
    /// keeps ticking for the generation it was spawned for
    generation: u64,
    next_entry_id: EntryId,
    clock_request: Option<u64>,
    persisted_scores: Vec<(String, u32)>,
}

impl RoomState {
    pub fn new(code: RoomCode, config: GameConfig) -> Self {
        Self {
            code,
            config,
            letter: random_letter(),
            players: HashMap::new(),
            rounds_played: 0,
            phase: Phase::Lobby,
            remaining_seconds: 0,
            validation: ValidationQueue::default(),
            senders: HashMap::new(),
            closed: false,
            generation: 0,
            next_entry_id: 1,
            clock_request: None,
            persisted_scores: Vec::new(),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Hand the pending clock start (if any) to the caller
    pub fn take_clock_request(&mut self) -> Option<u64> {
        self.clock_request.take()
    }

    pub fn active_count(&self) -> usize {
        self.players.values().filter(|p| p.is_active).count()
    }

    pub fn ready_count(&self) -> usize {
        self.players.values().filter(|p| p.is_ready).count()
    }

    /// Active player IDs in ascending order
    pub fn sorted_active_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.is_active)
            .map(|p| p.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Leaderboard pairs if they changed since the last call
    pub fn take_score_changes(&mut self) -> Option<Vec<(String, u32)>> {
        let mut current: Vec<(String, u32)> = self
            .players
            .values()
            .map(|p| (p.display_name.clone(), p.total_score))
            .collect();
        current.sort();
        if current == self.persisted_scores {
            return None;
        }
        self.persisted_scores = current.clone();
        Some(current)
    }
}

pub fn random_letter() -> char {
    let mut rng = rand::rng();
    rng.random_range(b'A'..=b'Z') as char
}
