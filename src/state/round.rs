use super::{random_letter, RoomState};
use crate::types::*;

/// What a single clock tick did to the room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Countdown decremented, round still running
    Continue,
    /// Countdown hit zero and the round was closed
    Expired,
    /// The round this clock belongs to is over; nothing changed
    Stopped,
}

impl RoomState {
    /// Begin a new round.
    ///
    /// With `select_by_ready` only players that voted to continue take part,
    /// otherwise everyone present does. An empty field parks the room in
    /// `WaitingRestart`; running out of rounds finishes the game.
    pub fn start_round(&mut self, select_by_ready: bool) {
        if self.phase == Phase::Finished {
            tracing::debug!(room = %self.code, "Game finished, not starting a round");
            return;
        }

        let mut active = 0;
        for player in self.players.values_mut() {
            player.is_active = !select_by_ready || player.is_ready;
            player.is_ready = false;
            if player.is_active {
                active += 1;
            }
        }

        if active == 0 {
            tracing::info!(room = %self.code, "No active players, waiting for ready votes");
            self.phase = Phase::WaitingRestart;
            self.remaining_seconds = 0;
            self.validation.clear();
            return;
        }

        if self.rounds_played >= self.config.max_rounds {
            self.finish();
            return;
        }
        self.rounds_played += 1;

        for player in self.players.values_mut() {
            player.answers.clear();
            if player.is_active {
                player.score = 0;
            }
        }

        self.letter = random_letter();
        self.remaining_seconds = self.config.round_seconds;
        self.phase = Phase::RoundActive;
        self.validation.clear();
        self.generation += 1;
        self.clock_request = Some(self.generation);

        tracing::info!(
            room = %self.code,
            "Round {}/{} started with letter {} and {} players",
            self.rounds_played,
            self.config.max_rounds,
            self.letter,
            active
        );
    }

    /// Advance the countdown by one second for the clock of `generation`
    pub fn tick(&mut self, generation: u64) -> ClockTick {
        if self.phase != Phase::RoundActive || generation != self.generation {
            return ClockTick::Stopped;
        }
        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);
        if self.remaining_seconds == 0 {
            tracing::info!(room = %self.code, "Round {} timed out", self.rounds_played);
            self.end_round();
            return ClockTick::Expired;
        }
        ClockTick::Continue
    }

    /// Close answer collection and hand over to peer validation.
    /// Whichever of timeout and completion arrives second is a no-op.
    pub fn end_round(&mut self) -> bool {
        if self.phase != Phase::RoundActive {
            return false;
        }
        self.remaining_seconds = 0;
        self.phase = Phase::ValidationPending;
        self.build_validation_queue();
        tracing::info!(
            room = %self.code,
            "Validating {} answers for round {}",
            self.validation.entries.len(),
            self.rounds_played
        );
        self.settle_validation();
        true
    }

    /// Called once the validation queue is exhausted
    pub(crate) fn enter_waiting(&mut self) {
        self.validation.clear();
        if self.rounds_played >= self.config.max_rounds {
            self.finish();
            return;
        }
        self.phase = Phase::WaitingRestart;
        self.remaining_seconds = 0;
        for player in self.players.values_mut() {
            player.is_active = false;
            player.is_ready = false;
        }
    }

    pub(crate) fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.remaining_seconds = 0;
        self.validation.clear();
        for player in self.players.values_mut() {
            player.is_active = false;
            player.is_ready = false;
        }
        tracing::info!(room = %self.code, "Game finished after {} rounds", self.rounds_played);
    }

    /// Administrative reset: new settings, fresh scores, then an immediate round
    pub fn reconfigure(&mut self, update: &ConfigUpdate) {
        self.config.apply(update);
        self.generation += 1;
        self.phase = Phase::Lobby;
        self.validation.clear();
        self.rounds_played = 0;
        self.remaining_seconds = 0;
        for player in self.players.values_mut() {
            player.score = 0;
            player.total_score = 0;
            player.answers.clear();
            player.is_active = false;
            player.is_ready = false;
        }
        self.letter = random_letter();
        tracing::info!(
            room = %self.code,
            "Room reconfigured: {} categories, {}s, {} rounds",
            self.config.categories.len(),
            self.config.round_seconds,
            self.config.max_rounds
        );
        self.start_round(false);
    }
}
