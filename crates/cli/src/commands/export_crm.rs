use std::path::PathBuf;

use clap::Args;
use leadflow_core::artifacts::{load_prior_run, write_crm_payload, CRM_PAYLOAD_FILE};
use leadflow_core::config::AppConfig;
use leadflow_core::crm::{export_payload, CrmFormat};

use crate::commands::CommandResult;

const COMMAND: &str = "export-crm";

#[derive(Debug, Clone, Args)]
pub struct ExportCrmArgs {
    #[arg(long, help = "Output directory of a previous `run`")]
    pub out: PathBuf,
    #[arg(long, default_value = "salesforce", help = "Target CRM layout")]
    pub format: String,
    #[arg(long, help = "Payload path; defaults to <out>/crm_payload.json")]
    pub output: Option<PathBuf>,
}

pub fn run(config: &AppConfig, args: ExportCrmArgs) -> CommandResult {
    let format = match CrmFormat::parse(&args.format) {
        Ok(format) => format,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let (fields, scores) = match load_prior_run(&args.out) {
        Ok(prior) => prior,
        Err(error) => return CommandResult::from_error(COMMAND, &error),
    };

    let payload = export_payload(format, &fields, &scores, &config.crm.salesforce_lead);
    let target = args.output.unwrap_or_else(|| args.out.join(CRM_PAYLOAD_FILE));
    if let Err(error) = write_crm_payload(&target, &payload) {
        return CommandResult::from_error(COMMAND, &error);
    }

    tracing::info!(
        event_name = "leadflow.crm.exported",
        format = %format,
        lead_id = %fields.lead_id,
        fields = payload.payload.len(),
        path = %target.display(),
        "crm payload written"
    );
    CommandResult::success(
        COMMAND,
        format!("wrote {format} payload for {} to {}", fields.lead_id, target.display()),
    )
}
