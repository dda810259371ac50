use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::lead::{LeadFields, LeadId};
use crate::domain::score::{Scores, Stage};

/// One row of the append-only run history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_ts: DateTime<Utc>,
    pub lead_id: LeadId,
    pub input_source: String,
    pub account_name: String,
    pub industry: String,
    pub budget: String,
    pub timeline: String,
    pub fit_score: u8,
    pub intent_score: u8,
    pub stage: Stage,
    pub out_dir: String,
}

impl RunRecord {
    pub fn from_run(
        run_ts: DateTime<Utc>,
        fields: &LeadFields,
        scores: &Scores,
        input_source: impl Into<String>,
        out_dir: impl Into<String>,
    ) -> Self {
        Self {
            run_ts,
            lead_id: fields.lead_id.clone(),
            input_source: input_source.into(),
            account_name: fields.profile.account_name.clone(),
            industry: fields.profile.industry.clone(),
            budget: fields.profile.budget.clone(),
            timeline: fields.profile.timeline.clone(),
            fit_score: scores.fit_score,
            intent_score: scores.intent_score,
            stage: scores.stage,
            out_dir: out_dir.into(),
        }
    }
}

/// A stored run record together with its store-assigned id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunHistoryEntry {
    pub id: i64,
    pub record: RunRecord,
}
