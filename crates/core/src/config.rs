use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::score::Stage;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub extraction: ExtractionConfig,
    pub redaction: RedactionConfig,
    pub scoring: ScoringConfig,
    pub output: OutputConfig,
    pub crm: CrmConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ExtractionConfig {
    pub strategy: ExtractionStrategyKind,
    pub llm_model: String,
    pub llm_api_key: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct RedactionConfig {
    pub enabled: bool,
    pub max_excerpt_chars: usize,
}

/// Weights and stage thresholds used by the scorer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScoringConfig {
    pub base_fit: i32,
    pub base_intent: i32,
    pub fit_industry_known: i32,
    pub fit_business_model_known: i32,
    pub fit_account_named: i32,
    pub fit_crm_salesforce: i32,
    pub fit_mentions_automation_tracking: i32,
    pub fit_pain_points_identified: i32,
    pub intent_budget_known: i32,
    pub intent_timeline_known: i32,
    pub intent_stakeholders_known: i32,
    pub intent_per_extra_stakeholder: i32,
    pub intent_stakeholder_breadth_cap: i32,
    pub intent_few_open_questions: i32,
    /// Evaluated top to bottom; the first satisfied rule decides the stage.
    pub stage_rules: Vec<StageRule>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageRule {
    pub stage: Stage,
    pub min_fit: u8,
    pub min_intent: u8,
}

#[derive(Clone, Debug)]
pub struct OutputConfig {
    pub language: EmailLanguage,
    pub owner: String,
}

#[derive(Clone, Debug)]
pub struct CrmConfig {
    /// Salesforce `Lead` field name -> lead source key.
    pub salesforce_lead: BTreeMap<String, String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategyKind {
    RuleBased,
    External,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailLanguage {
    #[serde(alias = "zh")]
    Primary,
    Bilingual,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub extraction_strategy: Option<ExtractionStrategyKind>,
    pub redaction_enabled: Option<bool>,
    pub language: Option<EmailLanguage>,
    pub owner: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://leadflow.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            extraction: ExtractionConfig {
                strategy: ExtractionStrategyKind::RuleBased,
                llm_model: "offline-stub".to_string(),
                llm_api_key: None,
            },
            redaction: RedactionConfig { enabled: true, max_excerpt_chars: 500 },
            scoring: ScoringConfig::default(),
            output: OutputConfig { language: EmailLanguage::Primary, owner: "You".to_string() },
            crm: CrmConfig { salesforce_lead: default_salesforce_lead_map() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_fit: 0,
            base_intent: 0,
            fit_industry_known: 20,
            fit_business_model_known: 15,
            fit_account_named: 15,
            fit_crm_salesforce: 10,
            fit_mentions_automation_tracking: 20,
            fit_pain_points_identified: 20,
            intent_budget_known: 30,
            intent_timeline_known: 25,
            intent_stakeholders_known: 15,
            intent_per_extra_stakeholder: 5,
            intent_stakeholder_breadth_cap: 10,
            intent_few_open_questions: 20,
            stage_rules: vec![
                StageRule { stage: Stage::Sql, min_fit: 70, min_intent: 70 },
                StageRule { stage: Stage::Mql, min_fit: 40, min_intent: 40 },
            ],
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

pub fn default_salesforce_lead_map() -> BTreeMap<String, String> {
    [
        ("Company", "account_name"),
        ("Industry", "industry"),
        ("LeadSource", "source"),
        ("Description", "summary_text"),
        ("Budget__c", "budget"),
        ("Timeline__c", "timeline"),
        ("Lead_Stage__c", "stage"),
        ("Rating", "rating"),
        ("Fit_Score__c", "fit_score"),
        ("Intent_Score__c", "intent_score"),
    ]
    .into_iter()
    .map(|(crm_field, source_key)| (crm_field.to_string(), source_key.to_string()))
    .collect()
}

impl std::str::FromStr for ExtractionStrategyKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "rule_based" | "rules" | "heuristic" => Ok(Self::RuleBased),
            "external" | "llm" => Ok(Self::External),
            other => Err(ConfigError::Validation(format!(
                "unsupported extraction strategy `{other}` (expected rule_based|external)"
            ))),
        }
    }
}

impl std::str::FromStr for EmailLanguage {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "primary" | "zh" => Ok(Self::Primary),
            "bilingual" => Ok(Self::Bilingual),
            other => Err(ConfigError::Validation(format!(
                "unsupported email language `{other}` (expected primary|bilingual)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("leadflow.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(extraction) = patch.extraction {
            if let Some(strategy) = extraction.strategy {
                self.extraction.strategy = strategy;
            }
            if let Some(llm_model) = extraction.llm_model {
                self.extraction.llm_model = llm_model;
            }
            if let Some(llm_api_key) = extraction.llm_api_key {
                self.extraction.llm_api_key = Some(secret_value(llm_api_key));
            }
        }

        if let Some(redaction) = patch.redaction {
            if let Some(enabled) = redaction.enabled {
                self.redaction.enabled = enabled;
            }
            if let Some(max_excerpt_chars) = redaction.max_excerpt_chars {
                self.redaction.max_excerpt_chars = max_excerpt_chars;
            }
        }

        if let Some(scoring) = patch.scoring {
            self.scoring.apply_patch(scoring);
        }

        if let Some(output) = patch.output {
            if let Some(language) = output.language {
                self.output.language = language;
            }
            if let Some(owner) = output.owner {
                self.output.owner = owner;
            }
        }

        if let Some(crm) = patch.crm {
            if let Some(salesforce_lead) = crm.salesforce_lead {
                self.crm.salesforce_lead = salesforce_lead;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("LEADFLOW_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("LEADFLOW_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("LEADFLOW_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("LEADFLOW_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("LEADFLOW_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("LEADFLOW_EXTRACTION_STRATEGY") {
            self.extraction.strategy = value.parse()?;
        }
        if let Some(value) = read_env("LEADFLOW_LLM_MODEL") {
            self.extraction.llm_model = value;
        }
        if let Some(value) = read_env("LEADFLOW_LLM_API_KEY") {
            self.extraction.llm_api_key = Some(secret_value(value));
        }

        if let Some(value) = read_env("LEADFLOW_REDACTION_ENABLED") {
            self.redaction.enabled = parse_bool("LEADFLOW_REDACTION_ENABLED", &value)?;
        }
        if let Some(value) = read_env("LEADFLOW_REDACTION_MAX_EXCERPT_CHARS") {
            self.redaction.max_excerpt_chars =
                parse_usize("LEADFLOW_REDACTION_MAX_EXCERPT_CHARS", &value)?;
        }

        if let Some(value) = read_env("LEADFLOW_OUTPUT_LANGUAGE") {
            self.output.language = value.parse()?;
        }
        if let Some(value) = read_env("LEADFLOW_OUTPUT_OWNER") {
            self.output.owner = value;
        }

        let log_level =
            read_env("LEADFLOW_LOGGING_LEVEL").or_else(|| read_env("LEADFLOW_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("LEADFLOW_LOGGING_FORMAT").or_else(|| read_env("LEADFLOW_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(strategy) = overrides.extraction_strategy {
            self.extraction.strategy = strategy;
        }
        if let Some(enabled) = overrides.redaction_enabled {
            self.redaction.enabled = enabled;
        }
        if let Some(language) = overrides.language {
            self.output.language = language;
        }
        if let Some(owner) = overrides.owner {
            self.output.owner = owner;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_extraction(&self.extraction)?;
        validate_redaction(&self.redaction)?;
        validate_scoring(&self.scoring)?;
        validate_output(&self.output)?;
        validate_crm(&self.crm)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

impl ScoringConfig {
    fn apply_patch(&mut self, patch: ScoringPatch) {
        let weights = [
            (&mut self.base_fit, patch.base_fit),
            (&mut self.base_intent, patch.base_intent),
            (&mut self.fit_industry_known, patch.fit_industry_known),
            (&mut self.fit_business_model_known, patch.fit_business_model_known),
            (&mut self.fit_account_named, patch.fit_account_named),
            (&mut self.fit_crm_salesforce, patch.fit_crm_salesforce),
            (&mut self.fit_mentions_automation_tracking, patch.fit_mentions_automation_tracking),
            (&mut self.fit_pain_points_identified, patch.fit_pain_points_identified),
            (&mut self.intent_budget_known, patch.intent_budget_known),
            (&mut self.intent_timeline_known, patch.intent_timeline_known),
            (&mut self.intent_stakeholders_known, patch.intent_stakeholders_known),
            (&mut self.intent_per_extra_stakeholder, patch.intent_per_extra_stakeholder),
            (&mut self.intent_stakeholder_breadth_cap, patch.intent_stakeholder_breadth_cap),
            (&mut self.intent_few_open_questions, patch.intent_few_open_questions),
        ];
        for (slot, value) in weights {
            if let Some(value) = value {
                *slot = value;
            }
        }

        if let Some(stage_rules) = patch.stage_rules {
            self.stage_rules = stage_rules;
        }
    }
}

/// Explicit path if it exists, else `leadflow.toml`, else `config/leadflow.toml`.
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("leadflow.toml"), PathBuf::from("config/leadflow.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_extraction(extraction: &ExtractionConfig) -> Result<(), ConfigError> {
    if extraction.strategy == ExtractionStrategyKind::External
        && extraction.llm_model.trim().is_empty()
    {
        return Err(ConfigError::Validation(
            "extraction.llm_model is required for the external strategy".to_string(),
        ));
    }

    Ok(())
}

fn validate_redaction(redaction: &RedactionConfig) -> Result<(), ConfigError> {
    if redaction.max_excerpt_chars > 10_000 {
        return Err(ConfigError::Validation(
            "redaction.max_excerpt_chars must be in range 0..=10000".to_string(),
        ));
    }

    Ok(())
}

fn validate_scoring(scoring: &ScoringConfig) -> Result<(), ConfigError> {
    for rule in &scoring.stage_rules {
        if rule.stage == Stage::Early {
            return Err(ConfigError::Validation(
                "scoring.stage_rules must not list `Early`; it is the fallthrough stage"
                    .to_string(),
            ));
        }
        if rule.min_fit > 100 || rule.min_intent > 100 {
            return Err(ConfigError::Validation(format!(
                "scoring.stage_rules thresholds for `{}` must be in range 0..=100",
                rule.stage
            )));
        }
    }

    let descending = scoring.stage_rules.windows(2).all(|pair| pair[0].stage > pair[1].stage);
    if !descending {
        return Err(ConfigError::Validation(
            "scoring.stage_rules must be ordered from the highest stage down (SQL before MQL), \
             each stage at most once"
                .to_string(),
        ));
    }

    let weights = [
        ("fit_industry_known", scoring.fit_industry_known),
        ("fit_business_model_known", scoring.fit_business_model_known),
        ("fit_account_named", scoring.fit_account_named),
        ("fit_crm_salesforce", scoring.fit_crm_salesforce),
        ("fit_mentions_automation_tracking", scoring.fit_mentions_automation_tracking),
        ("fit_pain_points_identified", scoring.fit_pain_points_identified),
        ("intent_budget_known", scoring.intent_budget_known),
        ("intent_timeline_known", scoring.intent_timeline_known),
        ("intent_stakeholders_known", scoring.intent_stakeholders_known),
        ("intent_per_extra_stakeholder", scoring.intent_per_extra_stakeholder),
        ("intent_stakeholder_breadth_cap", scoring.intent_stakeholder_breadth_cap),
        ("intent_few_open_questions", scoring.intent_few_open_questions),
    ];
    if let Some((name, _)) = weights.iter().find(|(_, weight)| *weight < 0) {
        return Err(ConfigError::Validation(format!("scoring.{name} must not be negative")));
    }

    for (name, base) in [("base_fit", scoring.base_fit), ("base_intent", scoring.base_intent)] {
        if !(0..=100).contains(&base) {
            return Err(ConfigError::Validation(format!(
                "scoring.{name} must be in range 0..=100"
            )));
        }
    }

    // An empty lead must land in `Early`.
    if let Some(rule) = scoring.stage_rules.iter().find(|rule| {
        scoring.base_fit >= i32::from(rule.min_fit)
            && scoring.base_intent >= i32::from(rule.min_intent)
    }) {
        return Err(ConfigError::Validation(format!(
            "scoring.base_fit/base_intent ({}/{}) already satisfy the `{}` stage rule; \
             a lead with no signals must stay `Early`",
            scoring.base_fit, scoring.base_intent, rule.stage
        )));
    }

    Ok(())
}

fn validate_output(output: &OutputConfig) -> Result<(), ConfigError> {
    if output.owner.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output.owner must not be empty; it signs the follow-up email".to_string(),
        ));
    }

    Ok(())
}

fn validate_crm(crm: &CrmConfig) -> Result<(), ConfigError> {
    let blank = crm
        .salesforce_lead
        .iter()
        .any(|(crm_field, source_key)| crm_field.trim().is_empty() || source_key.trim().is_empty());
    if blank {
        return Err(ConfigError::Validation(
            "crm.salesforce_lead entries need a non-empty CRM field and source key".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    extraction: Option<ExtractionPatch>,
    redaction: Option<RedactionPatch>,
    scoring: Option<ScoringPatch>,
    output: Option<OutputPatch>,
    crm: Option<CrmPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ExtractionPatch {
    strategy: Option<ExtractionStrategyKind>,
    llm_model: Option<String>,
    llm_api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RedactionPatch {
    enabled: Option<bool>,
    max_excerpt_chars: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct ScoringPatch {
    base_fit: Option<i32>,
    base_intent: Option<i32>,
    fit_industry_known: Option<i32>,
    fit_business_model_known: Option<i32>,
    fit_account_named: Option<i32>,
    fit_crm_salesforce: Option<i32>,
    fit_mentions_automation_tracking: Option<i32>,
    fit_pain_points_identified: Option<i32>,
    intent_budget_known: Option<i32>,
    intent_timeline_known: Option<i32>,
    intent_stakeholders_known: Option<i32>,
    intent_per_extra_stakeholder: Option<i32>,
    intent_stakeholder_breadth_cap: Option<i32>,
    intent_few_open_questions: Option<i32>,
    stage_rules: Option<Vec<StageRule>>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputPatch {
    language: Option<EmailLanguage>,
    owner: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CrmPatch {
    salesforce_lead: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use tempfile::TempDir;

    use super::{
        AppConfig, ConfigError, ConfigOverrides, EmailLanguage, ExtractionStrategyKind,
        LoadOptions, LogFormat, ScoringConfig,
    };
    use crate::domain::score::Stage;

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    fn write_config(dir: &TempDir, body: &str) -> Result<std::path::PathBuf, String> {
        let path = dir.path().join("leadflow.toml");
        fs::write(&path, body).map_err(|err| err.to_string())?;
        Ok(path)
    }

    #[test]
    fn defaults_validate_without_a_config_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let config = AppConfig::load(LoadOptions {
            config_path: Some(dir.path().join("absent.toml")),
            ..LoadOptions::default()
        })
        .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.redaction.enabled, "redaction should default to enabled")?;
        ensure(
            config.extraction.strategy == ExtractionStrategyKind::RuleBased,
            "rule-based extraction should be the default strategy",
        )?;
        ensure(config.scoring.stage_rules.len() == 2, "default cascade should have two rules")?;
        ensure(
            matches!(config.logging.format, LogFormat::Compact),
            "default logging format should be compact",
        )
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_LEADFLOW_OWNER", "Ziyu");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[output]
owner = "${TEST_LEADFLOW_OWNER}"
language = "bilingual"
"#,
            )?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.output.owner == "Ziyu", "owner should be loaded from environment")?;
            ensure(
                config.output.language == EmailLanguage::Bilingual,
                "language should be read from the file",
            )
        })();

        clear_vars(&["TEST_LEADFLOW_OWNER"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_DATABASE_URL", "sqlite://from-env.db");
        env::set_var("LEADFLOW_OUTPUT_OWNER", "Env Owner");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = write_config(
                &dir,
                r#"
[database]
url = "sqlite://from-file.db"

[output]
owner = "File Owner"

[logging]
level = "warn"
"#,
            )?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(config.output.owner == "Env Owner", "env owner should win over file")
        })();

        clear_vars(&["LEADFLOW_DATABASE_URL", "LEADFLOW_OUTPUT_OWNER"]);
        result
    }

    #[test]
    fn scoring_weights_and_stage_rules_load_from_file() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[scoring]
base_fit = 50
intent_budget_known = 15

[[scoring.stage_rules]]
stage = "SQL"
min_fit = 80
min_intent = 75

[[scoring.stage_rules]]
stage = "MQL"
min_fit = 65
min_intent = 60

[crm.salesforce_lead]
Company = "account_name"
"#,
        )?;

        let config =
            AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.scoring.base_fit == 50, "base_fit should come from the file")?;
        ensure(config.scoring.intent_budget_known == 15, "budget weight should be patched")?;
        ensure(config.scoring.fit_industry_known == 20, "unpatched weights keep defaults")?;
        ensure(config.scoring.stage_rules[0].stage == Stage::Sql, "first rule should be SQL")?;
        ensure(config.scoring.stage_rules[1].min_fit == 65, "MQL threshold should be patched")?;
        ensure(config.crm.salesforce_lead.len() == 1, "crm map should be replaced wholesale")
    }

    #[test]
    fn validation_rejects_out_of_order_stage_rules() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
        let path = write_config(
            &dir,
            r#"
[[scoring.stage_rules]]
stage = "MQL"
min_fit = 40
min_intent = 40

[[scoring.stage_rules]]
stage = "SQL"
min_fit = 70
min_intent = 70
"#,
        )?;

        let error =
            match AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
            {
                Ok(_) => return Err("expected validation failure for MQL-before-SQL".to_string()),
                Err(error) => error,
            };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("stage_rules")),
            "validation failure should mention stage_rules",
        )
    }

    #[test]
    fn invalid_env_override_fails_fast_with_actionable_error() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_REDACTION_ENABLED", "sometimes");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected invalid override but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            ensure(
                matches!(
                    error,
                    ConfigError::InvalidEnvOverride { ref key, .. }
                        if key == "LEADFLOW_REDACTION_ENABLED"
                ),
                "error should name the offending variable",
            )
        })();

        clear_vars(&["LEADFLOW_REDACTION_ENABLED"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("LEADFLOW_LOG_LEVEL", "warn");
        env::set_var("LEADFLOW_LOG_FORMAT", "json");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "warning log level should be set from env var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Json),
                "json logging format should be set from env var",
            )
        })();

        clear_vars(&["LEADFLOW_LOG_LEVEL", "LEADFLOW_LOG_FORMAT"]);
        result
    }

    #[test]
    fn validation_rejects_negative_scoring_weights() -> Result<(), String> {
        let mut scoring = ScoringConfig::default();
        scoring.intent_timeline_known = -5;

        match super::validate_scoring(&scoring) {
            Ok(()) => Err("negative weight should be rejected".to_string()),
            Err(ConfigError::Validation(message)) => ensure(
                message.contains("intent_timeline_known"),
                "error should name the negative weight",
            ),
            Err(other) => Err(format!("unexpected error: {other}")),
        }
    }

    #[test]
    fn validation_rejects_base_scores_that_already_reach_a_stage() -> Result<(), String> {
        let mut scoring = ScoringConfig::default();
        scoring.base_fit = 80;
        scoring.base_intent = 80;

        match super::validate_scoring(&scoring) {
            Ok(()) => Err("base scores meeting the SQL rule should be rejected".to_string()),
            Err(ConfigError::Validation(message)) => {
                ensure(message.contains("SQL"), "error should name the satisfied stage")
            }
            Err(other) => Err(format!("unexpected error: {other}")),
        }?;

        scoring.base_fit = 80;
        scoring.base_intent = 39;
        super::validate_scoring(&scoring).map_err(|err| format!("80/39 stays Early: {err}"))?;

        scoring.base_intent = 101;
        ensure(super::validate_scoring(&scoring).is_err(), "base above 100 should be rejected")
    }
}
