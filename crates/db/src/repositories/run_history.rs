use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use leadflow_core::domain::lead::LeadId;
use leadflow_core::domain::run::{RunHistoryEntry, RunRecord};
use leadflow_core::domain::score::Stage;

use super::{RepositoryError, RunRecordRepository};
use crate::DbPool;

pub struct SqlRunRecordRepository {
    pool: DbPool,
}

impl SqlRunRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RunRecordRepository for SqlRunRecordRepository {
    async fn append(&self, record: RunRecord) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO lead_runs (
                run_ts, lead_id, input_source, account_name, industry, budget, timeline,
                fit_score, intent_score, stage, out_dir
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.run_ts.to_rfc3339_opts(SecondsFormat::Micros, true))
        .bind(&record.lead_id.0)
        .bind(&record.input_source)
        .bind(&record.account_name)
        .bind(&record.industry)
        .bind(&record.budget)
        .bind(&record.timeline)
        .bind(i64::from(record.fit_score))
        .bind(i64::from(record.intent_score))
        .bind(record.stage.as_str())
        .bind(&record.out_dir)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<RunHistoryEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, run_ts, lead_id, input_source, account_name, industry, budget, timeline,
                    fit_score, intent_score, stage, out_dir
             FROM lead_runs
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }
}

fn entry_from_row(row: SqliteRow) -> Result<RunHistoryEntry, RepositoryError> {
    let stage_raw = row.try_get::<String, _>("stage")?;
    let stage = stage_raw
        .parse::<Stage>()
        .map_err(|_| RepositoryError::Decode(format!("unknown stage `{stage_raw}`")))?;

    Ok(RunHistoryEntry {
        id: row.try_get("id")?,
        record: RunRecord {
            run_ts: parse_timestamp("run_ts", row.try_get("run_ts")?)?,
            lead_id: LeadId(row.try_get("lead_id")?),
            input_source: row.try_get("input_source")?,
            account_name: row.try_get("account_name")?,
            industry: row.try_get("industry")?,
            budget: row.try_get("budget")?,
            timeline: row.try_get("timeline")?,
            fit_score: parse_score("fit_score", row.try_get("fit_score")?)?,
            intent_score: parse_score("intent_score", row.try_get("intent_score")?)?,
            stage,
            out_dir: row.try_get("out_dir")?,
        },
    })
}

fn parse_score(column: &str, value: i64) -> Result<u8, RepositoryError> {
    u8::try_from(value).ok().filter(|score| *score <= 100).ok_or_else(|| {
        RepositoryError::Decode(format!("invalid value for `{column}` (expected 0..=100): {value}"))
    })
}

fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use leadflow_core::domain::lead::LeadId;
    use leadflow_core::domain::run::RunRecord;
    use leadflow_core::domain::score::Stage;

    use super::SqlRunRecordRepository;
    use crate::repositories::{RepositoryError, RunRecordRepository};
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    fn record(n: i64) -> RunRecord {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).single().expect("valid timestamp");
        RunRecord {
            run_ts: base + Duration::minutes(n),
            lead_id: LeadId(format!("LEAD-0000000{n}")),
            input_source: "notes.txt".to_string(),
            account_name: "Acme Corp".to_string(),
            industry: "SaaS".to_string(),
            budget: "$50k".to_string(),
            timeline: "Q3".to_string(),
            fit_score: 45,
            intent_score: 70,
            stage: Stage::Mql,
            out_dir: format!("out/run-{n}"),
        }
    }

    #[tokio::test]
    async fn appended_record_reads_back_unchanged() {
        let repo = SqlRunRecordRepository::new(setup_pool().await);
        let stored = record(1);

        let id = repo.append(stored.clone()).await.expect("append");
        let recent = repo.recent(10).await.expect("recent");

        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, id);
        assert_eq!(recent[0].record, stored);
    }

    #[tokio::test]
    async fn recent_returns_newest_first_up_to_limit() {
        let repo = SqlRunRecordRepository::new(setup_pool().await);
        for n in 1..=5 {
            repo.append(record(n)).await.expect("append");
        }

        let recent = repo.recent(2).await.expect("recent");

        let ids: Vec<i64> = recent.iter().map(|entry| entry.id).collect();
        assert_eq!(ids, vec![5, 4]);
        assert_eq!(recent[0].record.out_dir, "out/run-5");
    }

    #[tokio::test]
    async fn recent_on_empty_store_is_empty() {
        let repo = SqlRunRecordRepository::new(setup_pool().await);

        assert!(repo.recent(10).await.expect("recent").is_empty());
    }

    #[tokio::test]
    async fn stored_rows_reject_update_and_delete() {
        let pool = setup_pool().await;
        let repo = SqlRunRecordRepository::new(pool.clone());
        repo.append(record(1)).await.expect("append");

        let update = sqlx::query("UPDATE lead_runs SET budget = 'free' WHERE id = 1")
            .execute(&pool)
            .await
            .expect_err("update must be rejected");
        assert!(update.to_string().contains("append-only"));

        sqlx::query("DELETE FROM lead_runs").execute(&pool).await.expect_err("delete rejected");

        let recent = repo.recent(1).await.expect("recent");
        assert_eq!(recent[0].record.budget, "$50k");
    }

    #[tokio::test]
    async fn corrupt_stage_is_a_decode_error() {
        let pool = setup_pool().await;
        sqlx::query(
            "INSERT INTO lead_runs (
                run_ts, lead_id, input_source, account_name, industry, budget, timeline,
                fit_score, intent_score, stage, out_dir
            ) VALUES ('not-a-time', 'LEAD-X', 'stdin', 'A', 'B', 'C', 'D', 1, 1, 'Early', 'out')",
        )
        .execute(&pool)
        .await
        .expect("insert raw row");

        let error = SqlRunRecordRepository::new(pool).recent(1).await.expect_err("bad timestamp");

        assert!(matches!(error, RepositoryError::Decode(ref message) if message.contains("run_ts")));
    }
}
