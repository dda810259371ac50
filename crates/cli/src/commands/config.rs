use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use leadflow_core::config::{resolve_config_path, AppConfig};
use secrecy::ExposeSecret;
use toml::Value;

/// Where a setting came from, highest precedence first.
#[derive(Debug, Default)]
pub struct SourceContext {
    pub config_path: Option<PathBuf>,
    pub log_level_flag: bool,
}

pub fn run(config: &AppConfig, context: &SourceContext) -> String {
    let config_file_path = resolve_config_path(context.config_path.as_deref());
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let mut lines =
        vec!["effective config (source precedence: flag > env > file > default):".to_string()];

    lines.push(render_line(
        "database.url",
        &config.database.url,
        source("database.url", &["LEADFLOW_DATABASE_URL"]),
    ));
    lines.push(render_line(
        "database.max_connections",
        &config.database.max_connections.to_string(),
        source("database.max_connections", &["LEADFLOW_DATABASE_MAX_CONNECTIONS"]),
    ));
    lines.push(render_line(
        "database.timeout_secs",
        &config.database.timeout_secs.to_string(),
        source("database.timeout_secs", &["LEADFLOW_DATABASE_TIMEOUT_SECS"]),
    ));

    lines.push(render_line(
        "extraction.strategy",
        &format!("{:?}", config.extraction.strategy),
        source("extraction.strategy", &["LEADFLOW_EXTRACTION_STRATEGY"]),
    ));
    lines.push(render_line(
        "extraction.llm_model",
        &config.extraction.llm_model,
        source("extraction.llm_model", &["LEADFLOW_LLM_MODEL"]),
    ));
    let llm_api_key = config
        .extraction
        .llm_api_key
        .as_ref()
        .map(|key| redact_secret(key.expose_secret()))
        .unwrap_or_else(|| "<unset>".to_string());
    lines.push(render_line(
        "extraction.llm_api_key",
        &llm_api_key,
        source("extraction.llm_api_key", &["LEADFLOW_LLM_API_KEY"]),
    ));

    lines.push(render_line(
        "redaction.enabled",
        &config.redaction.enabled.to_string(),
        source("redaction.enabled", &["LEADFLOW_REDACTION_ENABLED"]),
    ));
    lines.push(render_line(
        "redaction.max_excerpt_chars",
        &config.redaction.max_excerpt_chars.to_string(),
        source("redaction.max_excerpt_chars", &["LEADFLOW_REDACTION_MAX_EXCERPT_CHARS"]),
    ));

    let stage_rules = config
        .scoring
        .stage_rules
        .iter()
        .map(|rule| format!("{}>={}/{}", rule.stage, rule.min_fit, rule.min_intent))
        .collect::<Vec<_>>()
        .join(", ");
    lines.push(render_line("scoring.stage_rules", &stage_rules, source("scoring.stage_rules", &[])));

    lines.push(render_line(
        "output.language",
        &format!("{:?}", config.output.language),
        source("output.language", &["LEADFLOW_OUTPUT_LANGUAGE"]),
    ));
    lines.push(render_line(
        "output.owner",
        &config.output.owner,
        source("output.owner", &["LEADFLOW_OUTPUT_OWNER"]),
    ));

    lines.push(render_line(
        "crm.salesforce_lead",
        &format!("{} mapped fields", config.crm.salesforce_lead.len()),
        source("crm.salesforce_lead", &[]),
    ));

    let level_source = if context.log_level_flag {
        "flag (--log-level)".to_string()
    } else {
        source("logging.level", &["LEADFLOW_LOGGING_LEVEL", "LEADFLOW_LOG_LEVEL"])
    };
    lines.push(render_line("logging.level", &config.logging.level, level_source));
    lines.push(render_line(
        "logging.format",
        &format!("{:?}", config.logging.format),
        source("logging.format", &["LEADFLOW_LOGGING_FORMAT", "LEADFLOW_LOG_FORMAT"]),
    ));

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a `sk-` style prefix so operators can tell keys apart.
fn redact_secret(secret: &str) -> String {
    let trimmed = secret.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
