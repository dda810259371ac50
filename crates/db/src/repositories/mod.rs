use async_trait::async_trait;
use thiserror::Error;

use leadflow_core::domain::run::{RunHistoryEntry, RunRecord};

pub mod memory;
pub mod run_history;

pub use memory::InMemoryRunRecordRepository;
pub use run_history::SqlRunRecordRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Append-only store of completed runs.
#[async_trait]
pub trait RunRecordRepository: Send + Sync {
    /// Stores `record` and returns its id. Ids increase with insertion order.
    async fn append(&self, record: RunRecord) -> Result<i64, RepositoryError>;

    /// Up to `limit` most recent records, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<RunHistoryEntry>, RepositoryError>;
}
