pub mod commands;
pub mod telemetry;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use leadflow_core::config::{AppConfig, ConfigOverrides, LoadOptions};

use commands::config::SourceContext;
use commands::export_crm::ExportCrmArgs;
use commands::history::HistoryArgs;
use commands::run::RunArgs;
use commands::CommandResult;

#[derive(Debug, Parser)]
#[command(
    name = "leadflow",
    about = "Turn raw lead notes into structured fields, scores and follow-ups",
    long_about = "Extract lead fields from free-form sales notes, score fit and intent, draft \
                  next actions and a follow-up email, export CRM payloads and keep a run history.",
    after_help = "Examples:\n  leadflow run --input notes.txt --out out/acme\n  \
                  pbpaste | leadflow run --stdin --out out/chat --lang bilingual\n  \
                  leadflow export-crm --out out/acme\n  leadflow history --limit 5"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to a leadflow.toml config file")]
    pub config: Option<PathBuf>,
    #[arg(long, global = true, help = "Log level for stderr diagnostics (trace..error)")]
    pub log_level: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Extract, score and draft follow-ups for one lead; writes artifacts to --out")]
    Run(RunArgs),
    #[command(about = "Map a previous run's fields and scores onto a CRM upsert payload")]
    ExportCrm(ExportCrmArgs),
    #[command(about = "List the most recent recorded runs")]
    History(HistoryArgs),
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::ExportCrm(_) => "export-crm",
            Self::History(_) => "history",
            Self::Config => "config",
        }
    }
}

/// Loads configuration, installs logging and dispatches one command.
pub fn execute(cli: Cli) -> CommandResult {
    let command_name = cli.command.name();
    let options = LoadOptions {
        config_path: cli.config.clone(),
        require_file: cli.config.is_some(),
        overrides: ConfigOverrides { log_level: cli.log_level.clone(), ..ConfigOverrides::default() },
    };

    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                command_name,
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    if let Err(error) = telemetry::init(&config.logging) {
        tracing::debug!(event_name = "leadflow.telemetry.reused", %error, "subscriber already set");
    }

    match cli.command {
        Command::Run(args) => commands::run::run(&config, args),
        Command::ExportCrm(args) => commands::export_crm::run(&config, args),
        Command::History(args) => commands::history::run(&config, args),
        Command::Config => {
            let context =
                SourceContext { config_path: cli.config, log_level_flag: cli.log_level.is_some() };
            CommandResult::text(commands::config::run(&config, &context))
        }
    }
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let result = execute(cli);

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
