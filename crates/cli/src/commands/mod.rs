pub mod config;
pub mod export_crm;
pub mod history;
pub mod run;

use leadflow_core::config::DatabaseConfig;
use leadflow_core::errors::{ErrorClass, LeadflowError};
use leadflow_db::{connect_with_settings, migrations, DbPool};
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_class(command: &str, class: ErrorClass, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!(
            event_name = "leadflow.command.failed",
            command,
            error_class = class.as_str(),
            %message,
            "command failed"
        );
        Self::failure(command, class.as_str(), message, class.exit_code())
    }

    pub fn from_error(command: &str, error: &LeadflowError) -> Self {
        Self::from_class(command, error.class(), error.to_string())
    }

    /// Plain-text output (tables) with a zero exit code.
    pub fn text(output: impl Into<String>) -> Self {
        Self { exit_code: 0, output: output.into() }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Opens the run-history database and applies pending migrations.
pub(crate) async fn open_run_store(
    database_url: &str,
    settings: &DatabaseConfig,
) -> Result<DbPool, String> {
    let pool = connect_with_settings(database_url, settings.max_connections, settings.timeout_secs)
        .await
        .map_err(|error| format!("could not open run history `{database_url}`: {error}"))?;
    migrations::run_pending(&pool)
        .await
        .map_err(|error| format!("could not migrate run history `{database_url}`: {error}"))?;
    Ok(pool)
}

pub(crate) fn current_thread_runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| format!("failed to initialize async runtime: {error}"))
}
