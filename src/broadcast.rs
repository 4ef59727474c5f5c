use crate::protocol::{PlayerView, RoomSnapshot, ServerMessage, ValidationView};
use crate::state::{PlayerSender, RoomState};
use crate::types::{Phase, PlayerId};
use tokio::sync::mpsc::error::TrySendError;

/// A message bound for one connection
pub struct Delivery {
    pub player_id: PlayerId,
    pub sender: PlayerSender,
    pub msg: ServerMessage,
}

impl RoomState {
    /// Spectator view: everything public, no answers
    pub fn snapshot(&self) -> RoomSnapshot {
        let mut players: Vec<PlayerView> = self.players.values().map(PlayerView::from).collect();
        players.sort_by(|a, b| a.id.cmp(&b.id));

        let validation = if self.phase == Phase::ValidationPending {
            self.validation.live().map(ValidationView::from)
        } else {
            None
        };

        RoomSnapshot {
            room: self.code.clone(),
            phase: self.phase,
            letter: self.letter,
            categories: self.config.categories.clone(),
            round_seconds: self.config.round_seconds,
            remaining_seconds: self.remaining_seconds,
            round_number: self.rounds_played,
            round_limit: self.config.max_rounds,
            players,
            ready_count: self.ready_count(),
            active_count: self.active_count(),
            validation,
            validation_pending: self.validation.pending(),
            your_answers: Default::default(),
            server_now: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// One state message per connected player, each carrying only the
    /// recipient's own answers
    pub fn outbound(&self) -> Vec<Delivery> {
        let base = self.snapshot();
        self.senders
            .iter()
            .map(|(player_id, sender)| {
                let mut snapshot = base.clone();
                if let Some(player) = self.players.get(player_id) {
                    snapshot.your_answers = player.answers.clone();
                }
                Delivery {
                    player_id: player_id.clone(),
                    sender: sender.clone(),
                    msg: ServerMessage::State { snapshot },
                }
            })
            .collect()
    }
}

/// Push messages without blocking. Returns players whose connection is gone.
///
/// A full queue only drops this message: the next snapshot supersedes it.
pub fn deliver(deliveries: Vec<Delivery>) -> Vec<PlayerId> {
    let mut closed = Vec::new();
    for delivery in deliveries {
        match delivery.sender.try_send(delivery.msg) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(player = %delivery.player_id, "Outbound queue full, dropping snapshot");
            }
            Err(TrySendError::Closed(_)) => closed.push(delivery.player_id),
        }
    }
    closed
}
