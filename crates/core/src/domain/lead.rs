use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marker stored in place of any field the extractor could not populate.
pub const UNKNOWN: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("LEAD-{}", suffix[..8].to_ascii_uppercase()))
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fields recovered from the customer text itself.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadProfile {
    pub account_name: String,
    pub industry: String,
    pub business_model: String,
    pub use_case: String,
    pub pain_points: Vec<String>,
    pub must_haves: Vec<String>,
    #[serde(default)]
    pub nice_to_haves: Vec<String>,
    pub budget: String,
    pub timeline: String,
    pub stakeholders: Vec<String>,
    #[serde(default)]
    pub open_questions: Vec<String>,
}

impl LeadProfile {
    /// Profile with every field set to the unknown marker.
    pub fn unknown() -> Self {
        Self {
            account_name: UNKNOWN.to_string(),
            industry: UNKNOWN.to_string(),
            business_model: UNKNOWN.to_string(),
            use_case: UNKNOWN.to_string(),
            pain_points: vec![UNKNOWN.to_string()],
            must_haves: vec![UNKNOWN.to_string()],
            nice_to_haves: Vec::new(),
            budget: UNKNOWN.to_string(),
            timeline: UNKNOWN.to_string(),
            stakeholders: vec![UNKNOWN.to_string()],
            open_questions: Vec::new(),
        }
    }
}

/// The persisted `fields.json` document: the extracted profile plus run metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadFields {
    pub lead_id: LeadId,
    pub source: String,
    #[serde(flatten)]
    pub profile: LeadProfile,
    pub pii_redacted: bool,
    pub text_hash: String,
    pub raw_text_excerpt: String,
}

pub fn is_known(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != UNKNOWN
}

/// Items of a sequence field, skipping the unknown marker.
pub fn known_items(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).filter(|item| is_known(item)).collect()
}

/// Collapses an empty sequence to the single unknown marker.
pub fn or_unknown(items: Vec<String>) -> Vec<String> {
    if items.is_empty() {
        vec![UNKNOWN.to_string()]
    } else {
        items
    }
}
