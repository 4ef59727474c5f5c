use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Set the display name for this connection
    Join { name: String },
    /// Replace this player's answers for the running round
    Answers { answers: HashMap<String, String> },
    /// Ready to continue with the next round
    Ready,
    /// Approve or veto the live validation entry
    Vote { entry_id: EntryId, approve: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First frame on every accepted connection
    Identity { player_id: PlayerId, room: RoomCode },
    State { snapshot: RoomSnapshot },
    Error { code: String, msg: String },
}

/// Public view of a player. Answers are never part of it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerView {
    pub id: PlayerId,
    pub display_name: String,
    pub score: u32,
    pub total_score: u32,
    pub is_active: bool,
    pub is_ready: bool,
}

impl From<&Player> for PlayerView {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id.clone(),
            display_name: p.display_name.clone(),
            score: p.score,
            total_score: p.total_score,
            is_active: p.is_active,
            is_ready: p.is_ready,
        }
    }
}

/// The entry currently open for votes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationView {
    pub id: EntryId,
    pub author_id: PlayerId,
    pub author_name: String,
    pub category: String,
    pub answer: String,
    pub required_approvals: usize,
    pub approvals: Vec<PlayerId>,
}

impl From<&ValidationEntry> for ValidationView {
    fn from(e: &ValidationEntry) -> Self {
        let mut approvals: Vec<PlayerId> = e.approvals.iter().cloned().collect();
        approvals.sort();
        Self {
            id: e.id,
            author_id: e.author_id.clone(),
            author_name: e.author_name.clone(),
            category: e.category.clone(),
            answer: e.answer.clone(),
            required_approvals: e.required_approvals,
            approvals,
        }
    }
}

/// Immutable copy of a room, taken under the room lock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSnapshot {
    pub room: RoomCode,
    pub phase: Phase,
    pub letter: char,
    pub categories: Vec<String>,
    pub round_seconds: u32,
    pub remaining_seconds: u32,
    pub round_number: u32,
    pub round_limit: u32,
    pub players: Vec<PlayerView>,
    pub ready_count: usize,
    pub active_count: usize,
    pub validation: Option<ValidationView>,
    /// Entries left including the live one
    pub validation_pending: usize,
    /// The recipient's own answers; empty for spectators
    #[serde(default)]
    pub your_answers: HashMap<String, String>,
    pub server_now: String,
}
