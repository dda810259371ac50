use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::lead::{is_known, LeadProfile};
use crate::domain::score::{Scores, Stage};
use crate::extraction::rules::INFERRED_B2B;

pub const CONFIRM_STAKEHOLDERS: &str =
    "Confirm key stakeholders & decision process（确认决策链与对接人）";
pub const SCHEDULE_DISCOVERY: &str =
    "Schedule a 20-min discovery call to validate requirements（安排需求澄清电话）";
pub const SHARE_PROTOTYPE: &str =
    "Share a short workflow prototype outline + expected data fields（发送流程原型大纲与字段清单）";
pub const CONFIRM_CRM: &str = "Confirm current CRM and data sources（确认当前 CRM 与数据来源/字段）";
pub const COLLECT_INVOICES: &str =
    "Collect 3–5 sample invoices to define validation rules（收集样例发票定义校验规则）";
pub const ASK_BUDGET: &str = "Ask for a budget range（询问预算范围）";
pub const CONFIRM_TIMELINE: &str = "Confirm target go-live timeline（确认期望上线时间）";
pub const PROPOSE_POC: &str = "Propose a POC scope & timeline this week（本周给出 POC 范围与时间线）";

static CRM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?-u:\b)CRM(?-u:\b)").expect("crm regex"));
static INVOICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)发票|invoice").expect("invoice regex"));

/// Ordered next steps for the lead. Stage-driven actions go first, gap-filling actions last.
pub fn recommend_actions(profile: &LeadProfile, scores: &Scores) -> Vec<String> {
    let mut actions = vec![CONFIRM_STAKEHOLDERS, SCHEDULE_DISCOVERY, SHARE_PROTOTYPE];

    let crm_mentioned = profile.must_haves.iter().any(|item| CRM_RE.is_match(item));
    if crm_mentioned || profile.business_model == INFERRED_B2B {
        actions.insert(0, CONFIRM_CRM);
    }
    if profile.must_haves.iter().any(|item| INVOICE_RE.is_match(item)) {
        actions.push(COLLECT_INVOICES);
    }
    if !is_known(&profile.budget) {
        actions.push(ASK_BUDGET);
    }
    if !is_known(&profile.timeline) {
        actions.push(CONFIRM_TIMELINE);
    }
    if scores.stage == Stage::Sql {
        actions.insert(0, PROPOSE_POC);
    }

    actions.into_iter().map(str::to_string).collect()
}
