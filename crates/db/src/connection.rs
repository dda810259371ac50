use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub type DbPool = sqlx::SqlitePool;

const SQLITE_SCHEME: &str = "sqlite:";
const MEMORY_URL: &str = "sqlite::memory:";

/// Opens a pool on `database_url`, creating the database file on first use.
pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    let url = resolve_database_url(database_url);
    let options = SqliteConnectOptions::from_str(&url)?.create_if_missing(true);

    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect_with(options)
        .await
}

/// Accepts either a `sqlite:` URL or a bare file path (`runs.db`, `./data/runs.db`).
pub fn resolve_database_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == ":memory:" {
        MEMORY_URL.to_string()
    } else if trimmed.starts_with(SQLITE_SCHEME) {
        trimmed.to_string()
    } else {
        format!("sqlite://{trimmed}")
    }
}

/// On-disk location behind a database URL, `None` for in-memory databases.
pub fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
    let url = resolve_database_url(database_url);
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix(SQLITE_SCHEME))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" || url.contains("mode=memory") {
        return None;
    }
    Some(PathBuf::from(path))
}
