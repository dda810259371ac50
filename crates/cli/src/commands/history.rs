use chrono::SecondsFormat;
use clap::Args;
use leadflow_core::config::AppConfig;
use leadflow_core::domain::run::RunHistoryEntry;
use leadflow_core::errors::ErrorClass;
use leadflow_db::repositories::{RunRecordRepository, SqlRunRecordRepository};
use leadflow_db::{resolve_database_url, sqlite_file_path};

use crate::commands::{current_thread_runtime, open_run_store, CommandResult};

const COMMAND: &str = "history";
const EMPTY_HISTORY: &str = "(no history)";
const HEADER: &str = "run_ts\tlead_id\taccount\tindustry\tfit\tintent\tstage\tout_dir";

#[derive(Debug, Clone, Args)]
pub struct HistoryArgs {
    #[arg(long, help = "Run history database (sqlite URL or file path); defaults to database.url")]
    pub db: Option<String>,
    #[arg(long, default_value_t = 10, help = "Number of most recent runs to show")]
    pub limit: u32,
}

pub fn run(config: &AppConfig, args: HistoryArgs) -> CommandResult {
    let database_url =
        args.db.as_deref().map(resolve_database_url).unwrap_or_else(|| config.database.url.clone());

    // Never create a database just to report that it is empty.
    if sqlite_file_path(&database_url).is_some_and(|path| !path.exists()) {
        return CommandResult::text(EMPTY_HISTORY);
    }

    let entries = match load_recent(config, &database_url, args.limit) {
        Ok(entries) => entries,
        Err(message) => {
            return CommandResult::from_class(COMMAND, ErrorClass::Persistence, message);
        }
    };
    tracing::debug!(event_name = "leadflow.history.listed", rows = entries.len(), "listed runs");

    CommandResult::text(render_table(&entries))
}

fn load_recent(
    config: &AppConfig,
    database_url: &str,
    limit: u32,
) -> Result<Vec<RunHistoryEntry>, String> {
    let runtime = current_thread_runtime()?;
    runtime.block_on(async {
        let pool = open_run_store(database_url, &config.database).await?;
        let entries = SqlRunRecordRepository::new(pool.clone())
            .recent(limit)
            .await
            .map_err(|error| format!("could not read run history: {error}"))?;
        pool.close().await;
        Ok(entries)
    })
}

pub fn render_table(entries: &[RunHistoryEntry]) -> String {
    if entries.is_empty() {
        return EMPTY_HISTORY.to_string();
    }

    let mut lines = Vec::with_capacity(entries.len() + 1);
    lines.push(HEADER.to_string());
    for entry in entries {
        let record = &entry.record;
        lines.push(
            [
                record.run_ts.to_rfc3339_opts(SecondsFormat::Secs, true),
                record.lead_id.to_string(),
                record.account_name.clone(),
                record.industry.clone(),
                record.fit_score.to_string(),
                record.intent_score.to_string(),
                record.stage.to_string(),
                record.out_dir.clone(),
            ]
            .join("\t"),
        );
    }
    lines.join("\n")
}
