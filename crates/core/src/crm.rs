use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::lead::{LeadFields, UNKNOWN};
use crate::domain::score::Scores;
use crate::errors::LeadflowError;

pub const EXTERNAL_ID_FIELD: &str = "External_Id__c";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CrmFormat {
    Salesforce,
}

impl CrmFormat {
    pub fn parse(raw: &str) -> Result<Self, LeadflowError> {
        match raw.trim().to_lowercase().as_str() {
            "salesforce" => Ok(Self::Salesforce),
            _ => Err(LeadflowError::UnsupportedCrmFormat(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salesforce => "salesforce",
        }
    }
}

impl std::fmt::Display for CrmFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Upsert document in the target CRM's field layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CrmPayload {
    pub object: String,
    pub action: String,
    pub payload: Map<String, Value>,
}

/// Projects stored fields and scores onto the CRM layout. `field_map` is CRM field -> source key.
pub fn export_payload(
    format: CrmFormat,
    fields: &LeadFields,
    scores: &Scores,
    field_map: &BTreeMap<String, String>,
) -> CrmPayload {
    match format {
        CrmFormat::Salesforce => salesforce_lead(fields, scores, field_map),
    }
}

fn salesforce_lead(
    fields: &LeadFields,
    scores: &Scores,
    field_map: &BTreeMap<String, String>,
) -> CrmPayload {
    let mut payload = Map::new();
    for (crm_field, source_key) in field_map {
        payload.insert(crm_field.clone(), source_value(source_key, fields, scores));
    }
    payload.insert(EXTERNAL_ID_FIELD.to_string(), Value::String(fields.lead_id.to_string()));

    CrmPayload { object: "Lead".to_string(), action: "upsert".to_string(), payload }
}

fn source_value(source_key: &str, fields: &LeadFields, scores: &Scores) -> Value {
    let profile = &fields.profile;
    match source_key {
        "lead_id" => Value::from(fields.lead_id.to_string()),
        "source" => Value::from(fields.source.clone()),
        "account_name" => Value::from(profile.account_name.clone()),
        "industry" => Value::from(profile.industry.clone()),
        "business_model" => Value::from(profile.business_model.clone()),
        "use_case" => Value::from(profile.use_case.clone()),
        "budget" => Value::from(profile.budget.clone()),
        "timeline" => Value::from(profile.timeline.clone()),
        "pain_points" => Value::from(profile.pain_points.join(", ")),
        "must_haves" => Value::from(profile.must_haves.join(", ")),
        "nice_to_haves" => Value::from(profile.nice_to_haves.join(", ")),
        "stakeholders" => Value::from(profile.stakeholders.join(", ")),
        "open_questions" => Value::from(profile.open_questions.join(", ")),
        "summary_text" => Value::from(summary_text(fields)),
        "stage" => Value::from(scores.stage.as_str()),
        "rating" => Value::from(scores.rating.as_str()),
        "fit_score" => Value::from(scores.fit_score),
        "intent_score" => Value::from(scores.intent_score),
        _ => Value::from(UNKNOWN),
    }
}

fn summary_text(fields: &LeadFields) -> String {
    let profile = &fields.profile;
    let open_questions = if profile.open_questions.is_empty() {
        "None".to_string()
    } else {
        profile.open_questions.join(", ")
    };

    [
        format!("Use case: {}", profile.use_case),
        format!("Pain points: {}", profile.pain_points.join(", ")),
        format!("Must-haves: {}", profile.must_haves.join(", ")),
        format!("Open questions: {open_questions}"),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{export_payload, CrmFormat, EXTERNAL_ID_FIELD};
    use crate::config::default_salesforce_lead_map;
    use crate::domain::lead::{LeadFields, LeadId, LeadProfile};
    use crate::domain::score::{Rating, Scores, Stage};
    use crate::errors::{ErrorClass, LeadflowError};

    fn fields() -> LeadFields {
        let mut profile = LeadProfile::unknown();
        profile.account_name = "Acme Corp".to_string();
        profile.budget = "$50k".to_string();
        profile.use_case = "Sales workflow automation".to_string();
        LeadFields {
            lead_id: LeadId("LEAD-1234ABCD".to_string()),
            source: "event".to_string(),
            profile,
            pii_redacted: true,
            text_hash: "hash".to_string(),
            raw_text_excerpt: String::new(),
        }
    }

    fn scores() -> Scores {
        Scores { fit_score: 45, intent_score: 70, stage: Stage::Mql, rating: Rating::Warm }
    }

    #[test]
    fn format_names_parse_case_insensitively() {
        assert_eq!(CrmFormat::parse("Salesforce").ok(), Some(CrmFormat::Salesforce));
        assert_eq!(CrmFormat::parse(" SALESFORCE ").ok(), Some(CrmFormat::Salesforce));

        let error = CrmFormat::parse("hubspot").expect_err("hubspot is not supported");
        assert!(matches!(error, LeadflowError::UnsupportedCrmFormat(ref name) if name == "hubspot"));
        assert_eq!(error.class(), ErrorClass::Configuration);
    }

    #[test]
    fn default_salesforce_mapping_projects_fields_and_scores() {
        let payload = export_payload(
            CrmFormat::Salesforce,
            &fields(),
            &scores(),
            &default_salesforce_lead_map(),
        );

        assert_eq!(payload.object, "Lead");
        assert_eq!(payload.action, "upsert");
        assert_eq!(payload.payload["Company"], "Acme Corp");
        assert_eq!(payload.payload["LeadSource"], "event");
        assert_eq!(payload.payload["Budget__c"], "$50k");
        assert_eq!(payload.payload["Lead_Stage__c"], "MQL");
        assert_eq!(payload.payload["Rating"], "Warm");
        assert_eq!(payload.payload["Fit_Score__c"], 45);
        assert_eq!(payload.payload[EXTERNAL_ID_FIELD], "LEAD-1234ABCD");

        let description = payload.payload["Description"].as_str().expect("description string");
        assert!(description.starts_with("Use case: Sales workflow automation\n"));
        assert!(description.ends_with("Open questions: None"));
    }

    #[test]
    fn unmapped_source_keys_fall_back_to_unknown() {
        let field_map =
            BTreeMap::from([("Favorite_Color__c".to_string(), "favorite_color".to_string())]);

        let payload = export_payload(CrmFormat::Salesforce, &fields(), &scores(), &field_map);

        assert_eq!(payload.payload["Favorite_Color__c"], "Unknown");
        assert_eq!(payload.payload.len(), 2);
    }
}
