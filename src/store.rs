//! Leaderboard persistence.
//!
//! Rooms push score snapshots here and never read them back. Writes run on
//! one background task per store; a failing store only costs a log line.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, oneshot, RwLock};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreRecord {
    pub room_code: String,
    pub player_name: String,
    pub total_score: u32,
    /// When the snapshot was taken (ISO8601)
    pub recorded_at: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[async_trait]
pub trait ScoreStore: Send + Sync {
    async fn save(&self, records: Vec<ScoreRecord>) -> Result<(), StoreError>;
}

/// Keeps the latest record per (room, player name)
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<(String, String), ScoreRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest records for a room, best score first
    pub async fn leaderboard(&self, room_code: &str) -> Vec<ScoreRecord> {
        let mut list: Vec<ScoreRecord> = self
            .records
            .read()
            .await
            .values()
            .filter(|r| r.room_code == room_code)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.total_score
                .cmp(&a.total_score)
                .then_with(|| a.player_name.cmp(&b.player_name))
        });
        list
    }
}

#[async_trait]
impl ScoreStore for MemoryStore {
    async fn save(&self, records: Vec<ScoreRecord>) -> Result<(), StoreError> {
        let mut map = self.records.write().await;
        for record in records {
            map.insert(
                (record.room_code.clone(), record.player_name.clone()),
                record,
            );
        }
        Ok(())
    }
}

/// Appends every snapshot as one JSON object per line
#[derive(Debug)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ScoreStore for JsonlStore {
    async fn save(&self, records: Vec<ScoreRecord>) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        for record in &records {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        Ok(())
    }
}

enum WriteJob {
    Save(Vec<ScoreRecord>),
    Flush(oneshot::Sender<()>),
}

/// Handle to the single task that writes to a store.
///
/// Jobs are applied in the order they were queued, so a later leaderboard
/// never gets overwritten by an earlier one. The task exits once every
/// handle is dropped.
#[derive(Clone)]
pub struct ScoreWriter {
    tx: mpsc::UnboundedSender<WriteJob>,
}

impl ScoreWriter {
    /// Spawn the writer task. Must be called inside a tokio runtime.
    pub fn spawn(store: Arc<dyn ScoreStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match job {
                    WriteJob::Save(records) => {
                        let room_code = records
                            .first()
                            .map(|r| r.room_code.clone())
                            .unwrap_or_default();
                        if let Err(e) = store.save(records).await {
                            tracing::warn!(room = %room_code, "Failed to persist scores: {}", e);
                        }
                    }
                    WriteJob::Flush(done) => {
                        let _ = done.send(());
                    }
                }
            }
            tracing::debug!("Score writer stopped");
        });
        Self { tx }
    }

    /// Queue a room's leaderboard without waiting for the write
    pub fn persist(&self, room_code: &str, scores: Vec<(String, u32)>) {
        let recorded_at = chrono::Utc::now().to_rfc3339();
        let records: Vec<ScoreRecord> = scores
            .into_iter()
            .map(|(player_name, total_score)| ScoreRecord {
                room_code: room_code.to_string(),
                player_name,
                total_score,
                recorded_at: recorded_at.clone(),
            })
            .collect();
        if records.is_empty() {
            return;
        }
        if self.tx.send(WriteJob::Save(records)).is_err() {
            tracing::warn!(room = %room_code, "Score writer is gone, dropping leaderboard");
        }
    }

    /// Wait until everything queued so far has been written
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.tx.send(WriteJob::Flush(done)).is_ok() {
            let _ = wait.await;
        }
    }
}
