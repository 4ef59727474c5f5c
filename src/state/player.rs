use super::RoomState;
use crate::types::*;
use std::collections::HashMap;

const FALLBACK_NAME: &str = "Anonymous";

/// Friendly placeholder name for players that have not introduced themselves
fn default_name() -> String {
    petname::petname(2, " ").unwrap_or_else(|| FALLBACK_NAME.to_string())
}

/// Trimmed, length-capped display name, or `None` if blank
fn clean_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(truncate_chars(trimmed, MAX_NAME_CHARS))
    }
}

impl RoomState {
    /// Register a freshly accepted connection as a player
    pub fn add_player(&mut self, name: Option<String>) -> Player {
        let display_name = name
            .as_deref()
            .and_then(clean_name)
            .unwrap_or_else(default_name);
        let mut player = Player::new(ulid::Ulid::new().to_string(), display_name);
        // Joining mid-round lets the newcomer play the rest of it
        player.is_active = self.phase == Phase::RoundActive;

        tracing::info!(
            room = %self.code,
            player = %player.id,
            "Player joined as {}",
            player.display_name
        );
        self.players.insert(player.id.clone(), player.clone());
        player
    }

    /// Change a player's display name; blank names are ignored
    pub fn rename_player(&mut self, player_id: &str, name: &str) -> bool {
        let Some(name) = clean_name(name) else {
            return false;
        };
        match self.players.get_mut(player_id) {
            Some(player) if player.display_name != name => {
                player.display_name = name;
                true
            }
            _ => false,
        }
    }

    /// Store a player's answers; a fully populated sheet ends the round early
    pub fn submit_answers(&mut self, player_id: &str, answers: &HashMap<String, String>) -> bool {
        if self.phase != Phase::RoundActive {
            tracing::debug!(room = %self.code, player = %player_id, "Ignoring answers outside a round");
            return false;
        }
        let Some(player) = self.players.get_mut(player_id) else {
            return false;
        };
        if !player.is_active {
            tracing::debug!(room = %self.code, player = %player_id, "Ignoring answers from inactive player");
            return false;
        }

        for category in &self.config.categories {
            let text = answers
                .get(category)
                .map(|t| truncate_chars(t, MAX_ANSWER_CHARS))
                .unwrap_or_default();
            player.answers.insert(category.clone(), text);
        }

        if player.has_complete_answers(&self.config.categories) {
            tracing::info!(room = %self.code, player = %player_id, "Answer sheet complete, ending round");
            self.end_round();
        }
        true
    }

    /// Ready-vote while waiting for the next round. Repeated votes are no-ops.
    pub fn mark_ready(&mut self, player_id: &str) -> bool {
        if !matches!(self.phase, Phase::Lobby | Phase::WaitingRestart) {
            return false;
        }
        match self.players.get_mut(player_id) {
            Some(player) if !player.is_ready => player.is_ready = true,
            _ => return false,
        }
        self.start_if_quorum();
        true
    }

    /// Start the next round with the ready players once enough of the room agrees
    pub fn start_if_quorum(&mut self) -> bool {
        if !matches!(self.phase, Phase::Lobby | Phase::WaitingRestart) || self.players.is_empty() {
            return false;
        }
        let ready = self.ready_count();
        let total = self.players.len();
        if ready > 0 && ready as f64 / total as f64 >= READY_QUORUM {
            tracing::info!(room = %self.code, "Ready quorum reached ({}/{})", ready, total);
            self.start_round(true);
            return true;
        }
        false
    }

    /// Drop a player and repair whatever phase the room is in
    pub fn remove_player(&mut self, player_id: &str) -> Option<Player> {
        self.senders.remove(player_id);
        let player = self.players.remove(player_id)?;
        tracing::info!(room = %self.code, player = %player_id, "Player {} left", player.display_name);

        match self.phase {
            Phase::ValidationPending => self.handle_validation_departure(&player),
            Phase::Lobby | Phase::WaitingRestart => {
                self.start_if_quorum();
            }
            Phase::RoundActive | Phase::Finished => {}
        }
        Some(player)
    }
}
