use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::lead::LeadProfile;
use crate::extraction::rules::RuleBasedExtractor;
use crate::extraction::ExtractionStrategy;

pub const LEAD_SCHEMA: &str = r#"{
  "type": "object",
  "properties": {
    "account_name": { "type": "string" },
    "industry": { "type": "string" },
    "business_model": { "type": "string", "description": "B2B, B2C or Unknown" },
    "use_case": { "type": "string" },
    "pain_points": { "type": "array", "items": { "type": "string" } },
    "must_haves": { "type": "array", "items": { "type": "string" } },
    "nice_to_haves": { "type": "array", "items": { "type": "string" } },
    "budget": { "type": "string" },
    "timeline": { "type": "string" },
    "stakeholders": { "type": "array", "items": { "type": "string" } },
    "open_questions": { "type": "array", "items": { "type": "string" } }
  }
}"#;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion backend `{model}` is unavailable: {reason}")]
    Unavailable { model: String, reason: String },
}

pub trait LlmClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Stand-in client for offline runs; always answers with an empty JSON object.
#[derive(Clone, Debug, Default)]
pub struct OfflineLlmClient;

impl LlmClient for OfflineLlmClient {
    fn complete(&self, _prompt: &str) -> Result<String, CompletionError> {
        Ok("{}".to_string())
    }
}

/// Asks an [`LlmClient`] for the lead profile and layers its non-empty answers over the
/// rule-based result. Any client or parse failure leaves the rule-based result as is.
pub struct ExternalExtractor<C> {
    client: C,
    fallback: RuleBasedExtractor,
}

impl<C: LlmClient> ExternalExtractor<C> {
    pub fn new(client: C) -> Self {
        Self { client, fallback: RuleBasedExtractor::new() }
    }

    fn completion(&self, text: &str) -> Option<Map<String, Value>> {
        let reply = self.client.complete(&build_prompt(text)).ok()?;
        match serde_json::from_str::<Value>(reply.trim()).ok()? {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl<C: LlmClient> ExtractionStrategy for ExternalExtractor<C> {
    fn name(&self) -> &'static str {
        "external"
    }

    fn extract(&self, text: &str) -> LeadProfile {
        let heuristic = self.fallback.extract(text);
        match self.completion(text) {
            Some(answer) => merge_answer(heuristic, answer),
            None => heuristic,
        }
    }
}

pub fn build_prompt(text: &str) -> String {
    format!(
        "You are a sales ops assistant. Extract structured lead info in JSON.\n\
         Schema:\n{LEAD_SCHEMA}\n\nText:\n{text}\n\nReturn JSON only.\n"
    )
}

fn merge_answer(heuristic: LeadProfile, answer: Map<String, Value>) -> LeadProfile {
    let mut merged = match serde_json::to_value(&heuristic) {
        Ok(Value::Object(object)) => object,
        _ => return heuristic,
    };

    for (key, value) in answer {
        if merged.contains_key(&key) && !is_empty_value(&value) {
            merged.insert(key, value);
        }
    }

    serde_json::from_value(Value::Object(merged)).unwrap_or(heuristic)
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(entries) => entries.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
