use super::{ClockTick, RoomState};
use crate::broadcast;
use crate::clock::spawn_round_clock;
use crate::error::GameError;
use crate::protocol::{RoomSnapshot, ServerMessage};
use crate::store::ScoreWriter;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Outbound queue of one connection
pub type PlayerSender = mpsc::Sender<ServerMessage>;

/// Slots per outbound queue; a client further behind than this misses snapshots
pub const OUTBOUND_QUEUE_SIZE: usize = 64;

/// One game session.
///
/// All mutation goes through a single lock. Snapshots are built and queued
/// to every connection before it is released, so each client sees states in
/// the order they happened. Queueing never waits on a socket.
pub struct Room {
    code: RoomCode,
    max_players: usize,
    state: Mutex<RoomState>,
    scores: ScoreWriter,
}

impl Room {
    pub fn new(
        code: RoomCode,
        config: GameConfig,
        max_players: usize,
        scores: ScoreWriter,
    ) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(RoomState::new(code.clone(), config)),
            code,
            max_players,
            scores,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn max_players(&self) -> usize {
        self.max_players
    }

    pub async fn player_count(&self) -> usize {
        self.state.lock().await.players.len()
    }

    pub async fn has_space(&self) -> bool {
        self.player_count().await < self.max_players
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Refuse further joins if nobody is left. Returns whether it closed.
    pub async fn close_if_empty(&self) -> bool {
        let mut state = self.state.lock().await;
        if state.players.is_empty() {
            state.closed = true;
        }
        state.closed
    }

    /// Spectator snapshot
    pub async fn snapshot(&self) -> RoomSnapshot {
        self.state.lock().await.snapshot()
    }

    /// Accept a new connection. The identity frame is queued before the
    /// first state snapshot.
    pub async fn join(
        self: &Arc<Self>,
        name: Option<String>,
        sender: PlayerSender,
    ) -> Result<PlayerId, GameError> {
        let mut state = self.state.lock().await;
        if state.closed {
            return Err(GameError::RoomNotFound(self.code.clone()));
        }
        if state.players.len() >= self.max_players {
            return Err(GameError::RoomFull {
                code: self.code.clone(),
                max: self.max_players,
            });
        }
        let player = state.add_player(name);
        let identity = ServerMessage::Identity {
            player_id: player.id.clone(),
            room: self.code.clone(),
        };
        if sender.try_send(identity).is_err() {
            tracing::warn!(room = %self.code, "Connection closed before identity was sent");
        }
        state.senders.insert(player.id.clone(), sender);
        self.publish_locked(&mut *state);
        Ok(player.id)
    }

    /// Disconnect a player; unknown IDs are ignored
    pub async fn leave(self: &Arc<Self>, player_id: &str) {
        self.mutate(|state| state.remove_player(player_id).is_some())
            .await;
    }

    pub async fn rename(self: &Arc<Self>, player_id: &str, name: &str) -> bool {
        self.mutate(|state| state.rename_player(player_id, name))
            .await
    }

    pub async fn submit_answers(
        self: &Arc<Self>,
        player_id: &str,
        answers: &HashMap<String, String>,
    ) -> bool {
        self.mutate(|state| state.submit_answers(player_id, answers))
            .await
    }

    pub async fn ready(self: &Arc<Self>, player_id: &str) -> bool {
        self.mutate(|state| state.mark_ready(player_id)).await
    }

    pub async fn vote(self: &Arc<Self>, player_id: &str, entry_id: EntryId, approve: bool) -> bool {
        self.mutate(|state| state.cast_vote(player_id, entry_id, approve))
            .await
    }

    pub async fn start_round(self: &Arc<Self>, select_by_ready: bool) {
        self.mutate(|state| {
            state.start_round(select_by_ready);
            true
        })
        .await;
    }

    pub async fn reconfigure(self: &Arc<Self>, update: &ConfigUpdate) {
        self.mutate(|state| {
            state.reconfigure(update);
            true
        })
        .await;
    }

    /// One second of the round clock
    pub async fn tick(self: &Arc<Self>, generation: u64) -> ClockTick {
        let mut state = self.state.lock().await;
        let outcome = state.tick(generation);
        if outcome != ClockTick::Stopped {
            self.publish_locked(&mut *state);
        }
        outcome
    }

    /// Send a message to a single connection
    pub async fn send_to(&self, player_id: &str, msg: ServerMessage) {
        let sender = self.state.lock().await.senders.get(player_id).cloned();
        if let Some(sender) = sender {
            if let Err(e) = sender.try_send(msg) {
                tracing::debug!(room = %self.code, player = %player_id, "Dropped direct message: {}", e);
            }
        }
    }

    /// Run `f` under the lock, then start a clock and broadcast as needed
    async fn mutate<F>(self: &Arc<Self>, f: F) -> bool
    where
        F: FnOnce(&mut RoomState) -> bool,
    {
        let mut state = self.state.lock().await;
        let changed = f(&mut *state);
        self.start_requested_clock(&mut *state);
        if changed {
            self.publish_locked(&mut *state);
        }
        changed
    }

    fn start_requested_clock(self: &Arc<Self>, state: &mut RoomState) {
        if let Some(generation) = state.take_clock_request() {
            spawn_round_clock(self.clone(), generation);
        }
    }

    /// Broadcast the current state to every connection
    pub async fn publish(self: &Arc<Self>) {
        let mut state = self.state.lock().await;
        self.publish_locked(&mut *state);
    }

    /// Queue a snapshot for every connection while the caller holds the lock.
    ///
    /// Connections found closed are treated as departures, which can change
    /// the state again, so repeat until delivery is clean.
    fn publish_locked(self: &Arc<Self>, state: &mut RoomState) {
        loop {
            if let Some(scores) = state.take_score_changes() {
                self.scores.persist(&self.code, scores);
            }

            let closed = broadcast::deliver(state.outbound());
            if closed.is_empty() {
                break;
            }

            for player_id in &closed {
                tracing::info!(room = %self.code, player = %player_id, "Delivery failed, dropping player");
                state.remove_player(player_id);
            }
            self.start_requested_clock(state);
        }
    }
}
