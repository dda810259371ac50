use tokio::sync::RwLock;

use leadflow_core::domain::run::{RunHistoryEntry, RunRecord};

use super::{RepositoryError, RunRecordRepository};

/// Process-local run history; ids start at 1 like the SQLite store.
#[derive(Default)]
pub struct InMemoryRunRecordRepository {
    records: RwLock<Vec<RunRecord>>,
}

#[async_trait::async_trait]
impl RunRecordRepository for InMemoryRunRecordRepository {
    async fn append(&self, record: RunRecord) -> Result<i64, RepositoryError> {
        let mut records = self.records.write().await;
        records.push(record);
        Ok(records.len() as i64)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<RunHistoryEntry>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records
            .iter()
            .enumerate()
            .rev()
            .take(limit as usize)
            .map(|(index, record)| RunHistoryEntry { id: index as i64 + 1, record: record.clone() })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use leadflow_core::domain::lead::LeadId;
    use leadflow_core::domain::run::RunRecord;
    use leadflow_core::domain::score::Stage;

    use super::InMemoryRunRecordRepository;
    use crate::repositories::RunRecordRepository;

    fn record(account: &str) -> RunRecord {
        RunRecord {
            run_ts: Utc::now(),
            lead_id: LeadId::generate(),
            input_source: "stdin".to_string(),
            account_name: account.to_string(),
            industry: "Unknown".to_string(),
            budget: "Unknown".to_string(),
            timeline: "Unknown".to_string(),
            fit_score: 0,
            intent_score: 0,
            stage: Stage::Early,
            out_dir: "out".to_string(),
        }
    }

    #[tokio::test]
    async fn ids_follow_insertion_order_and_recent_is_newest_first() {
        let repo = InMemoryRunRecordRepository::default();
        for account in ["first", "second", "third"] {
            repo.append(record(account)).await.expect("append");
        }

        let recent = repo.recent(2).await.expect("recent");

        assert_eq!(recent.len(), 2);
        assert_eq!((recent[0].id, recent[0].record.account_name.as_str()), (3, "third"));
        assert_eq!((recent[1].id, recent[1].record.account_name.as_str()), (2, "second"));
    }

    #[tokio::test]
    async fn zero_limit_returns_nothing() {
        let repo = InMemoryRunRecordRepository::default();
        repo.append(record("only")).await.expect("append");

        assert!(repo.recent(0).await.expect("recent").is_empty());
    }
}
