use sha2::{Digest, Sha256};

use crate::artifacts::RunArtifacts;
use crate::config::{AppConfig, EmailLanguage};
use crate::domain::lead::{LeadFields, LeadId};
use crate::errors::LeadflowError;
use crate::extraction::{strategy_from_config, ExtractionStrategy};
use crate::followup::{recommend_actions, FollowUpComposer};
use crate::redaction::{redact, RedactionCounts};
use crate::report::render_report;
use crate::scoring::LeadScorer;

/// Per-run inputs that are not part of the loaded configuration.
#[derive(Clone, Debug)]
pub struct RunRequest {
    pub raw_text: String,
    pub lead_id: Option<LeadId>,
    pub source: Option<String>,
    /// `false` forces redaction off for this run regardless of config.
    pub redact: bool,
    pub language: Option<EmailLanguage>,
    pub owner: Option<String>,
}

impl RunRequest {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            lead_id: None,
            source: None,
            redact: true,
            language: None,
            owner: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    pub artifacts: RunArtifacts,
    pub redaction: RedactionCounts,
}

/// Redact -> extract -> score -> actions -> email -> report, entirely in memory.
pub struct LeadPipeline {
    extractor: Box<dyn ExtractionStrategy>,
    scorer: LeadScorer,
    composer: FollowUpComposer,
    redaction_enabled: bool,
    max_excerpt_chars: usize,
    default_language: EmailLanguage,
    default_owner: String,
}

impl LeadPipeline {
    pub fn from_config(config: &AppConfig) -> Result<Self, LeadflowError> {
        Ok(Self {
            extractor: strategy_from_config(&config.extraction),
            scorer: LeadScorer::new(config.scoring.clone()),
            composer: FollowUpComposer::new()?,
            redaction_enabled: config.redaction.enabled,
            max_excerpt_chars: config.redaction.max_excerpt_chars,
            default_language: config.output.language,
            default_owner: config.output.owner.clone(),
        })
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    pub fn process(&self, request: RunRequest) -> Result<PipelineOutcome, LeadflowError> {
        let text_hash = sha256_hex(&request.raw_text);

        let redacting = self.redaction_enabled && request.redact;
        let (processed, redaction) = if redacting {
            let outcome = redact(&request.raw_text);
            (outcome.text, outcome.counts)
        } else {
            (request.raw_text, RedactionCounts::default())
        };

        let profile = self.extractor.extract(&processed);
        let fields = LeadFields {
            lead_id: request.lead_id.unwrap_or_else(LeadId::generate),
            source: request.source.unwrap_or_else(|| "Unknown".to_string()),
            profile,
            pii_redacted: redacting,
            text_hash,
            raw_text_excerpt: excerpt(&processed, self.max_excerpt_chars),
        };

        let scores = self.scorer.score(&fields.profile);
        let actions = recommend_actions(&fields.profile, &scores);
        let owner = request.owner.unwrap_or_else(|| self.default_owner.clone());
        let language = request.language.unwrap_or(self.default_language);
        let email = self.composer.compose(&fields.profile, &actions, &owner, language)?;
        let report = render_report(&fields, &scores, &actions, &email);

        Ok(PipelineOutcome {
            artifacts: RunArtifacts { fields, scores, actions, email, report },
            redaction,
        })
    }
}

pub fn sha256_hex(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// First `max_chars` characters, with `...` appended when the text was cut.
fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
