use crate::state::{ClockTick, Room};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub const TICK: Duration = Duration::from_secs(1);

/// Spawn the countdown for one round.
///
/// The task stops itself on the first tick after its round is over, whether
/// the round expired, was completed early or the room was reset.
pub fn spawn_round_clock(room: Arc<Room>, generation: u64) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + TICK, TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match room.tick(generation).await {
                ClockTick::Continue => {}
                ClockTick::Expired => break,
                ClockTick::Stopped => {
                    tracing::debug!(room = %room.code(), "Round clock {} stopped", generation);
                    break;
                }
            }
        }
    })
}
