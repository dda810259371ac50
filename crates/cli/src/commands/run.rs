use std::path::PathBuf;

use chrono::Utc;
use clap::{ArgGroup, Args};
use leadflow_core::artifacts::InputSource;
use leadflow_core::config::{AppConfig, EmailLanguage};
use leadflow_core::domain::lead::LeadId;
use leadflow_core::domain::run::RunRecord;
use leadflow_core::errors::ErrorClass;
use leadflow_core::pipeline::{LeadPipeline, RunRequest};
use leadflow_db::repositories::{RunRecordRepository, SqlRunRecordRepository};
use leadflow_db::{resolve_database_url, DbPool};
use tokio::runtime::Runtime;

use crate::commands::{current_thread_runtime, open_run_store, CommandResult};

const COMMAND: &str = "run";

#[derive(Debug, Clone, Args)]
#[command(group(ArgGroup::new("source_input").required(true).args(["input", "stdin"])))]
pub struct RunArgs {
    #[arg(long, help = "Read lead notes from this file")]
    pub input: Option<PathBuf>,
    #[arg(long, help = "Read lead notes from standard input")]
    pub stdin: bool,
    #[arg(long, help = "Directory that receives the run artifacts")]
    pub out: PathBuf,
    #[arg(long, help = "Run history database (sqlite URL or file path); defaults to database.url")]
    pub db: Option<String>,
    #[arg(long, help = "Do not append this run to the history database")]
    pub no_track: bool,
    #[arg(long, help = "Email language: primary|bilingual")]
    pub lang: Option<String>,
    #[arg(long, help = "Name used to sign the follow-up email")]
    pub owner: Option<String>,
    #[arg(long, help = "Lead source label (inbound, referral, event, ...)")]
    pub source: Option<String>,
    #[arg(long, help = "Use this lead id instead of generating one")]
    pub lead_id: Option<String>,
    #[arg(long, help = "Keep emails, phone numbers and ID numbers in the processed text")]
    pub no_redact: bool,
}

impl RunArgs {
    fn input_source(&self) -> InputSource {
        match &self.input {
            Some(path) if !self.stdin => InputSource::File(path.clone()),
            _ => InputSource::Stdin,
        }
    }
}

pub fn run(config: &AppConfig, args: RunArgs) -> CommandResult {
    let language = match args.lang.as_deref().map(str::parse::<EmailLanguage>).transpose() {
        Ok(language) => language,
        Err(error) => {
            return CommandResult::from_class(COMMAND, ErrorClass::Configuration, error.to_string())
        }
    };

    let pipeline = match LeadPipeline::from_config(config) {
        Ok(pipeline) => pipeline,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let input = args.input_source();
    let raw_text = match input.read() {
        Ok(text) => text,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };
    tracing::debug!(
        event_name = "leadflow.run.input_loaded",
        source = %input.label(),
        chars = raw_text.chars().count(),
        extractor = pipeline.extractor_name(),
        "loaded lead notes"
    );

    let request = RunRequest {
        raw_text,
        lead_id: non_blank(args.lead_id.as_deref()).map(LeadId),
        source: non_blank(args.source.as_deref()),
        redact: !args.no_redact,
        language,
        owner: non_blank(args.owner.as_deref()),
    };
    let outcome = match pipeline.process(request) {
        Ok(outcome) => outcome,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    if outcome.redaction.any() {
        tracing::info!(
            event_name = "leadflow.redaction.hit",
            emails = outcome.redaction.emails,
            phones = outcome.redaction.phones,
            national_ids = outcome.redaction.national_ids,
            "redacted sensitive literals before extraction"
        );
    }

    let artifacts = &outcome.artifacts;
    let out_dir = args.out.display().to_string();

    let store = if args.no_track {
        None
    } else {
        let database_url = args
            .db
            .as_deref()
            .map(resolve_database_url)
            .unwrap_or_else(|| config.database.url.clone());
        match RunStore::open(config, &database_url) {
            Ok(store) => Some(store),
            Err(message) => {
                return CommandResult::from_class(
                    COMMAND,
                    ErrorClass::Persistence,
                    format!("run history unavailable, no artifacts written: {message}"),
                )
            }
        }
    };

    let written = match artifacts.write_to(&args.out) {
        Ok(written) => written,
        Err(error) => {
            if let Some(store) = store {
                store.close();
            }
            return CommandResult::from_error(COMMAND, &error);
        }
    };

    let summary = format!(
        "wrote {} artifacts to {out_dir} (lead {}, stage {}, fit {}, intent {})",
        written.len(),
        artifacts.fields.lead_id,
        artifacts.scores.stage,
        artifacts.scores.fit_score,
        artifacts.scores.intent_score,
    );

    if let Some(store) = store {
        let record = RunRecord::from_run(
            Utc::now(),
            &artifacts.fields,
            &artifacts.scores,
            input.label(),
            out_dir.clone(),
        );
        if let Err(message) = store.append(record) {
            return CommandResult::from_class(
                COMMAND,
                ErrorClass::Persistence,
                format!("artifacts written to {out_dir}, but the run was not recorded: {message}"),
            );
        }
    }

    tracing::info!(
        event_name = "leadflow.run.completed",
        lead_id = %artifacts.fields.lead_id,
        stage = %artifacts.scores.stage,
        fit_score = artifacts.scores.fit_score,
        intent_score = artifacts.scores.intent_score,
        out_dir = %out_dir,
        tracked = !args.no_track,
        "lead run completed"
    );
    CommandResult::success(COMMAND, summary)
}

/// Blank flag values count as absent.
fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

/// History database opened and migrated ahead of the artifact writes.
struct RunStore {
    runtime: Runtime,
    pool: DbPool,
}

impl RunStore {
    fn open(config: &AppConfig, database_url: &str) -> Result<Self, String> {
        let runtime = current_thread_runtime()?;
        let pool = runtime.block_on(open_run_store(database_url, &config.database))?;
        Ok(Self { runtime, pool })
    }

    fn append(self, record: RunRecord) -> Result<i64, String> {
        let Self { runtime, pool } = self;
        runtime.block_on(async move {
            let appended = SqlRunRecordRepository::new(pool.clone())
                .append(record)
                .await
                .map_err(|error| format!("could not append run record: {error}"));
            pool.close().await;
            let id = appended?;
            tracing::debug!(event_name = "leadflow.history.appended", id, "recorded run");
            Ok(id)
        })
    }

    fn close(self) {
        let Self { runtime, pool } = self;
        runtime.block_on(pool.close());
    }
}
