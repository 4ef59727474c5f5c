use crate::protocol::ClientMessage;
use crate::state::Room;
use std::sync::Arc;

/// Dispatch a client message to the room. Returns whether the room changed.
///
/// Messages that do not apply in the current phase are dropped without a
/// reply; the next snapshot tells the client where the room is.
pub async fn handle_message(msg: ClientMessage, player_id: &str, room: &Arc<Room>) -> bool {
    let changed = match msg {
        ClientMessage::Join { name } => room.rename(player_id, &name).await,
        ClientMessage::Answers { answers } => room.submit_answers(player_id, &answers).await,
        ClientMessage::Ready => room.ready(player_id).await,
        ClientMessage::Vote { entry_id, approve } => {
            room.vote(player_id, entry_id, approve).await
        }
    };
    if !changed {
        tracing::debug!(room = %room.code(), player = %player_id, "Message ignored");
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerMessage;
    use crate::state::OUTBOUND_QUEUE_SIZE;
    use crate::store::{MemoryStore, ScoreWriter};
    use crate::types::{GameConfig, Phase};
    use std::collections::HashMap;
    use tokio::sync::mpsc;

    fn room() -> Arc<Room> {
        let config = GameConfig {
            categories: vec!["Animal".to_string()],
            round_seconds: 30,
            max_rounds: 2,
        };
        let scores = ScoreWriter::spawn(Arc::new(MemoryStore::new()));
        Room::new("HANDL".to_string(), config, 5, scores)
    }

    #[tokio::test]
    async fn test_join_message_renames() {
        let room = room();
        let (tx, mut rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let id = room.join(None, tx).await.unwrap();

        let changed = handle_message(
            ClientMessage::Join {
                name: "  Zoé  ".to_string(),
            },
            &id,
            &room,
        )
        .await;
        assert!(changed);

        let mut last_name = None;
        while let Ok(msg) = rx.try_recv() {
            if let ServerMessage::State { snapshot } = msg {
                last_name = snapshot.players.first().map(|p| p.display_name.clone());
            }
        }
        assert_eq!(last_name.as_deref(), Some("Zoé"));
    }

    #[tokio::test]
    async fn test_answers_outside_round_ignored() {
        let room = room();
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let id = room.join(None, tx).await.unwrap();

        let answers = HashMap::from([("Animal".to_string(), "Ant".to_string())]);
        assert!(!handle_message(ClientMessage::Answers { answers }, &id, &room).await);
        assert_eq!(room.phase().await, Phase::Lobby);
    }

    #[tokio::test]
    async fn test_ready_in_lobby_starts_round() {
        let room = room();
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let id = room.join(None, tx).await.unwrap();

        assert!(handle_message(ClientMessage::Ready, &id, &room).await);
        assert_eq!(room.phase().await, Phase::RoundActive);
    }

    #[tokio::test]
    async fn test_stale_vote_ignored() {
        let room = room();
        let (tx, _rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let id = room.join(None, tx).await.unwrap();

        let vote = ClientMessage::Vote {
            entry_id: 999,
            approve: true,
        };
        assert!(!handle_message(vote, &id, &room).await);
    }
}
