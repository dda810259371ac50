//! Fit/intent scoring and stage assignment.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ScoringConfig;
use crate::domain::lead::{is_known, known_items, LeadProfile};
use crate::domain::score::{Scores, Stage};

/// Must-have keywords that count as an automation or tracking requirement.
pub const AUTOMATION_SIGNALS: &[&str] =
    &["自动化", "tracking", "数据追踪", "workflow", "dashboard", "automation"];

static SALESFORCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?-u:\b)Salesforce(?-u:\b)").expect("salesforce regex"));

#[derive(Clone, Debug, Default)]
pub struct LeadScorer {
    config: ScoringConfig,
}

impl LeadScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, profile: &LeadProfile) -> Scores {
        let fit_score = clamp_score(self.fit(profile));
        let intent_score = clamp_score(self.intent(profile));
        let stage = self.stage_for(fit_score, intent_score);

        Scores { fit_score, intent_score, stage, rating: stage.rating() }
    }

    /// First satisfied rule wins; no satisfied rule means `Early`.
    pub fn stage_for(&self, fit_score: u8, intent_score: u8) -> Stage {
        self.config
            .stage_rules
            .iter()
            .find(|rule| fit_score >= rule.min_fit && intent_score >= rule.min_intent)
            .map(|rule| rule.stage)
            .unwrap_or(Stage::Early)
    }

    fn fit(&self, profile: &LeadProfile) -> i32 {
        let weights = &self.config;
        let must_haves = known_items(&profile.must_haves);
        let mut fit = weights.base_fit;

        if is_known(&profile.industry) {
            fit += weights.fit_industry_known;
        }
        if matches!(profile.business_model.as_str(), "B2B" | "B2C") {
            fit += weights.fit_business_model_known;
        }
        if is_known(&profile.account_name) {
            fit += weights.fit_account_named;
        }
        if must_haves.iter().any(|item| SALESFORCE_RE.is_match(item)) {
            fit += weights.fit_crm_salesforce;
        }
        if must_haves.iter().any(|item| AUTOMATION_SIGNALS.iter().any(|signal| item == signal)) {
            fit += weights.fit_mentions_automation_tracking;
        }
        if !known_items(&profile.pain_points).is_empty() {
            fit += weights.fit_pain_points_identified;
        }

        fit
    }

    fn intent(&self, profile: &LeadProfile) -> i32 {
        let weights = &self.config;
        let mut intent = weights.base_intent;

        if is_known(&profile.budget) {
            intent += weights.intent_budget_known;
        }
        if is_known(&profile.timeline) {
            intent += weights.intent_timeline_known;
        }

        let stakeholders = known_items(&profile.stakeholders).len();
        if stakeholders > 0 {
            intent += weights.intent_stakeholders_known;
            let extra = i32::try_from(stakeholders - 1).unwrap_or(i32::MAX);
            let breadth = extra.saturating_mul(weights.intent_per_extra_stakeholder);
            intent += breadth.min(weights.intent_stakeholder_breadth_cap);
        }

        if profile.open_questions.len() <= 1 {
            intent += weights.intent_few_open_questions;
        }

        intent
    }
}

fn clamp_score(raw: i32) -> u8 {
    u8::try_from(raw.clamp(0, 100)).unwrap_or(100)
}
