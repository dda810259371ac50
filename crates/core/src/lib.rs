pub mod artifacts;
pub mod config;
pub mod crm;
pub mod domain;
pub mod errors;
pub mod extraction;
pub mod followup;
pub mod pipeline;
pub mod redaction;
pub mod report;
pub mod scoring;

pub use artifacts::{load_prior_run, write_crm_payload, InputSource, RunArtifacts};
pub use config::{AppConfig, ConfigError, ConfigOverrides, EmailLanguage, LoadOptions};
pub use crm::{export_payload, CrmFormat, CrmPayload};
pub use domain::lead::{LeadFields, LeadId, LeadProfile, UNKNOWN};
pub use domain::run::{RunHistoryEntry, RunRecord};
pub use domain::score::{Rating, Scores, Stage};
pub use errors::{ErrorClass, LeadflowError};
pub use extraction::{ExtractionStrategy, RuleBasedExtractor};
pub use pipeline::{LeadPipeline, PipelineOutcome, RunRequest};
pub use redaction::{redact, RedactionCounts};
pub use scoring::LeadScorer;
