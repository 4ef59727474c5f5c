use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type RoomCode = String;
pub type EntryId = u64;

/// Room lifecycle phase
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    RoundActive,
    ValidationPending,
    WaitingRestart,
    Finished,
}

pub const MIN_ROUND_SECONDS: u32 = 15;
pub const MAX_ROUND_SECONDS: u32 = 600;
pub const MAX_ROUNDS_LIMIT: u32 = 20;
pub const MAX_ANSWER_CHARS: usize = 100;
pub const MAX_NAME_CHARS: usize = 32;

/// Share of connected players that must be ready before a new round starts
pub const READY_QUORUM: f64 = 0.66;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameConfig {
    pub categories: Vec<String>,
    pub round_seconds: u32,
    pub max_rounds: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            categories: default_categories(),
            round_seconds: 90,
            max_rounds: 5,
        }
    }
}

pub fn default_categories() -> Vec<String> {
    ["Artist", "Album", "Band", "Instrument", "Featuring"]
        .iter()
        .map(|c| c.to_string())
        .collect()
}

/// Partial configuration sent by an administrator. Missing or invalid fields
/// leave the current value untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    #[serde(default)]
    pub round_seconds: Option<u32>,
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

impl GameConfig {
    /// Apply an update field by field
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(categories) = &update.categories {
            let cleaned = sanitize_categories(categories);
            if !cleaned.is_empty() {
                self.categories = cleaned;
            }
        }
        if let Some(seconds) = update.round_seconds {
            if seconds >= MIN_ROUND_SECONDS {
                self.round_seconds = seconds.min(MAX_ROUND_SECONDS);
            }
        }
        if let Some(rounds) = update.max_rounds {
            if rounds >= 1 {
                self.max_rounds = rounds.min(MAX_ROUNDS_LIMIT);
            }
        }
    }
}

/// Trim, drop blanks and deduplicate while keeping the first occurrence's position
pub fn sanitize_categories(raw: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .filter(|c| seen.insert(c.to_lowercase()))
        .map(|c| c.to_string())
        .collect()
}

/// Truncate to at most `max` characters (not bytes)
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    /// Points earned in the current round
    pub score: u32,
    pub total_score: u32,
    /// Category -> free text, cleared every round
    #[serde(skip)]
    pub answers: HashMap<String, String>,
    pub is_active: bool,
    pub is_ready: bool,
}

impl Player {
    pub fn new(id: PlayerId, display_name: String) -> Self {
        Self {
            id,
            display_name,
            score: 0,
            total_score: 0,
            answers: HashMap::new(),
            is_active: false,
            is_ready: false,
        }
    }

    /// True when every category has a non-blank answer
    pub fn has_complete_answers(&self, categories: &[String]) -> bool {
        categories.iter().all(|cat| {
            self.answers
                .get(cat)
                .is_some_and(|text| !text.trim().is_empty())
        })
    }
}

/// One disputed (player, category, answer) triple awaiting peer approval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationEntry {
    pub id: EntryId,
    pub author_id: PlayerId,
    pub author_name: String,
    pub category: String,
    pub answer: String,
    pub required_approvals: usize,
    pub approvals: HashSet<PlayerId>,
    pub completed: bool,
    /// Meaningful only once `completed` is set
    pub accepted: bool,
}

impl ValidationEntry {
    pub fn is_settled_by_approvals(&self) -> bool {
        self.approvals.len() >= self.required_approvals
    }
}
