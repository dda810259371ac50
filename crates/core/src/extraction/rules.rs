use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::lead::{or_unknown, LeadProfile, UNKNOWN};
use crate::extraction::catalog::{
    LEADERSHIP, MUST_HAVES, NICE_TO_HAVES, PAIN_POINTS, REPORTING_STAKEHOLDER, STAKEHOLDERS,
};
use crate::extraction::ExtractionStrategy;

pub const INFERRED_B2B: &str = "Likely B2B (inferred)";
pub const URGENT_TIMELINE: &str = "ASAP（越快越好）";

pub const USE_CASE_INVOICE: &str = "Sales workflow + invoice checks";
pub const USE_CASE_REPORTING: &str =
    "Sales workflow + meeting summary + follow-up reminders + reporting";
pub const USE_CASE_AUTOMATION: &str = "Sales workflow automation";

pub const QUESTION_COMPANY: &str = "Company name?（公司名称？）";
pub const QUESTION_INDUSTRY: &str = "Industry?（行业？）";
pub const QUESTION_BUSINESS_MODEL: &str = "B2B or B2C?（B2B 还是 B2C？）";
pub const QUESTION_CRM: &str = "Which CRM are you using?（目前用的 CRM 是什么？）";
pub const QUESTION_BUDGET: &str = "Budget range?（预算范围？）";
pub const QUESTION_TIMELINE: &str = "Target timeline?（期望上线时间？）";
pub const QUESTION_STAKEHOLDERS: &str = "Decision makers involved?（决策链角色？）";

/// Ordered first-match table; every pattern captures the field value in group 1.
struct RuleTable {
    rules: Vec<Regex>,
}

impl RuleTable {
    fn new(patterns: &[&str]) -> Self {
        let rules =
            patterns.iter().map(|pattern| Regex::new(pattern).expect("extraction rule")).collect();
        Self { rules }
    }

    fn first_match(&self, text: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            let captured = rule.captures(text)?.get(1)?.as_str();
            let value = clean_capture(captured);
            (!value.is_empty()).then_some(value)
        })
    }
}

static ACCOUNT_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(&[
        r"客户[:：][ \t]*([^\n（(]+)",
        r"(?i)company[ \t]*(?:name)?[ \t]*[:：][ \t]*([^\n]+)",
        r"(?i)account[ \t]*[:：][ \t]*([^\n]+)",
    ])
});

static BUSINESS_MODEL_RULES: Lazy<RuleTable> =
    Lazy::new(|| RuleTable::new(&[r"(?i)(?-u:\b)(B2B|B2C)(?-u:\b)", r"（\s*(B2B|B2C)"]));

static INDUSTRY_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(&[
        r"[（(]\s*(?:B2B|B2C)\s*([^)）]+)[）)]",
        r"我们是[^\n]*?一家([^\n，。;；]+?)(?:公司|企业|集团|机构|团队)",
        r"行业[:：][ \t]*([^\n]+)",
        r"(?i)industry[ \t]*[:：][ \t]*([^\n]+)",
    ])
});

static BUDGET_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(&[
        r"[-•][ \t]*预算[:：][ \t]*([^\n]+)",
        r"预算[:：][ \t]*([^\n]+)",
        r"(?i)budget[ \t]*[:：][ \t]*([^\n]+)",
        r"([$€£¥][ \t]?\d[\d,.]*(?:[ \t]?[kKmM](?-u:\b))?)",
        r"(\d[\d,.]*(?:\s*-\s*\d[\d,.]*)?\s*(?:万|千)\s*(?:RMB|元|人民币)?)",
        r"(?i)(\d[\d,.]*(?:\s*-\s*\d[\d,.]*)?\s*[km]?\s*(?:USD|RMB|EUR|CNY|dollars))(?-u:\b)",
    ])
});

static TIMELINE_RULES: Lazy<RuleTable> = Lazy::new(|| {
    RuleTable::new(&[
        r"[-•][ \t]*时间线[:：][ \t]*([^\n]+)",
        r"时间线[:：][ \t]*([^\n]+)",
        r"(?i)timeline[ \t]*[:：][ \t]*([^\n]+)",
        r"(?i)(?-u:\b)((?:by|before|in|until)\s+(?:the\s+)?(?:end\s+of\s+)?(?:Q[1-4](?:\s+\d{4})?|(?:this|next)\s+(?:week|month|quarter|year)|(?:january|february|march|april|may|june|july|august|september|october|november|december)(?:\s+\d{4})?))(?-u:\b)",
        r"(?i)(?-u:\b)(within\s+\d+\s+(?:days?|weeks?|months?))(?-u:\b)",
        r"(2\s*周内|1-2\s*个月|两周内|本月|下月)",
        r"(?i)(?-u:\b)(Q[1-4])(?-u:\b)",
    ])
});

static URGENCY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(越快越好|尽快|(?-u:\b)ASAP(?-u:\b)|as soon as possible)").expect("urgency")
});
static LEADERSHIP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(领导|管理层|老板|总监|management|manager|director)").expect("leadership")
});
static ENTERPRISE_PROCESS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)((?-u:\b)CRM(?-u:\b)|销售效率|流程|复盘|看数据|dashboard)")
        .expect("enterprise process")
});
static LEADERSHIP_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(领导|管理层|management)").expect("leadership marker"));
static CRM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?-u:\b)CRM(?-u:\b)").expect("crm"));
static SALESFORCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?-u:\b)Salesforce(?-u:\b)").expect("salesforce"));
static CRM_NEGATED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(没有|无|未用|不用|不使用).{0,6}CRM|(?-u:\b)(?:no|without|don't have an?)\s+CRM(?-u:\b)",
    )
    .expect("crm negation")
});
static INVOICE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)发票|invoice").expect("invoice"));

const CONVERSATIONAL_PREFIXES: &[&str] = &["我们想", "想做", "搞个", "有没有", "能不能", "就是", "现在"];
const CJK_COMPANY_SUFFIXES: &[&str] = &[
    "有限公司",
    "股份有限公司",
    "集团",
    "科技",
    "贸易",
    "物流",
    "医疗",
    "信息",
    "网络",
    "软件",
    "咨询",
    "公司",
];
const LATIN_COMPANY_SUFFIXES: &[&str] = &[
    "inc",
    "corp",
    "corporation",
    "llc",
    "ltd",
    "gmbh",
    "limited",
    "group",
    "co",
    "company",
    "technologies",
    "solutions",
];

/// Offline keyword/pattern extractor.
#[derive(Clone, Copy, Debug, Default)]
pub struct RuleBasedExtractor;

impl RuleBasedExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ExtractionStrategy for RuleBasedExtractor {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    fn extract(&self, text: &str) -> LeadProfile {
        let account = ACCOUNT_RULES.first_match(text).filter(|name| looks_like_company_name(name));

        let stated_model = BUSINESS_MODEL_RULES.first_match(text).map(|model| model.to_uppercase());
        let leadership_signal = LEADERSHIP_RE.is_match(text);
        let inferred_b2b = stated_model.is_none()
            && leadership_signal
            && ENTERPRISE_PROCESS_RE.is_match(text);
        let business_model = match (&stated_model, inferred_b2b) {
            (Some(model), _) => model.clone(),
            (None, true) => INFERRED_B2B.to_string(),
            (None, false) => UNKNOWN.to_string(),
        };

        let industry = INDUSTRY_RULES.first_match(text);
        let budget = BUDGET_RULES.first_match(text);
        let timeline = TIMELINE_RULES
            .first_match(text)
            .or_else(|| URGENCY_RE.is_match(text).then(|| URGENT_TIMELINE.to_string()));

        let pain_points = PAIN_POINTS.matches(text);
        let must_haves = MUST_HAVES.matches(text);
        let nice_to_haves = NICE_TO_HAVES.matches(text);
        let stakeholders = collect_stakeholders(text);

        let crm_mentioned = must_haves.iter().any(|item| CRM_RE.is_match(item));
        let crm_question = inferred_b2b
            || (crm_mentioned && !SALESFORCE_RE.is_match(text) && !CRM_NEGATED_RE.is_match(text));

        let mut open_questions = Vec::new();
        if account.is_none() {
            open_questions.push(QUESTION_COMPANY.to_string());
        }
        if industry.is_none() {
            open_questions.push(QUESTION_INDUSTRY.to_string());
        }
        if stated_model.is_none() {
            open_questions.push(QUESTION_BUSINESS_MODEL.to_string());
        }
        if crm_question {
            open_questions.push(QUESTION_CRM.to_string());
        }
        if budget.is_none() {
            open_questions.push(QUESTION_BUDGET.to_string());
        }
        if timeline.is_none() {
            open_questions.push(QUESTION_TIMELINE.to_string());
        }
        if stakeholders.is_empty() {
            open_questions.push(QUESTION_STAKEHOLDERS.to_string());
        }

        let reporting_signal =
            text.contains("会后总结") && text.contains("跟进提醒") && leadership_signal;
        let use_case = if reporting_signal {
            USE_CASE_REPORTING
        } else if INVOICE_RE.is_match(text) {
            USE_CASE_INVOICE
        } else if !must_haves.is_empty() || !pain_points.is_empty() {
            USE_CASE_AUTOMATION
        } else {
            UNKNOWN
        };

        LeadProfile {
            account_name: account.unwrap_or_else(|| UNKNOWN.to_string()),
            industry: industry.unwrap_or_else(|| UNKNOWN.to_string()),
            business_model,
            use_case: use_case.to_string(),
            pain_points: or_unknown(pain_points),
            must_haves: or_unknown(must_haves),
            nice_to_haves,
            budget: budget.unwrap_or_else(|| UNKNOWN.to_string()),
            timeline: timeline.unwrap_or_else(|| UNKNOWN.to_string()),
            stakeholders: or_unknown(stakeholders),
            open_questions,
        }
    }
}

fn collect_stakeholders(text: &str) -> Vec<String> {
    let mut stakeholders = STAKEHOLDERS.matches(text);
    if stakeholders.is_empty() {
        stakeholders = LEADERSHIP.matches(text);
    }

    let has_reporting_line = stakeholders.iter().any(|role| LEADERSHIP_MARKER_RE.is_match(role));
    if has_reporting_line {
        stakeholders.retain(|role| !LEADERSHIP_MARKER_RE.is_match(role));
        stakeholders.push(REPORTING_STAKEHOLDER.to_string());
    }
    stakeholders
}

fn looks_like_company_name(candidate: &str) -> bool {
    let candidate = candidate.trim();
    let length = candidate.chars().count();
    if !(4..=40).contains(&length) {
        return false;
    }
    if CONVERSATIONAL_PREFIXES.iter().any(|prefix| candidate.starts_with(prefix)) {
        return false;
    }
    if CJK_COMPANY_SUFFIXES.iter().any(|suffix| candidate.ends_with(suffix)) {
        return true;
    }

    let mut words = candidate.split_whitespace();
    let last = words.next_back().map(|word| word.trim_end_matches('.').to_ascii_lowercase());
    let has_name_before_suffix = words.next().is_some();
    match last {
        Some(suffix) => has_name_before_suffix && LATIN_COMPANY_SUFFIXES.contains(&suffix.as_str()),
        None => false,
    }
}

fn clean_capture(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c: char| matches!(c, ',' | '.' | ';' | '，' | '。' | '；'))
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::{
        looks_like_company_name, RuleBasedExtractor, INFERRED_B2B, QUESTION_BUSINESS_MODEL,
        QUESTION_COMPANY, QUESTION_CRM, URGENT_TIMELINE, USE_CASE_INVOICE, USE_CASE_REPORTING,
    };
    use crate::domain::lead::{LeadProfile, UNKNOWN};
    use crate::extraction::catalog::REPORTING_STAKEHOLDER;
    use crate::extraction::ExtractionStrategy;

    const STRUCTURED_NOTES: &str = "客户：华东医疗科技有限公司（B2B 医疗器械）
需求：销售跟进很乱，经常漏跟进，希望做自动化 workflow 和 dashboard，能对接 Salesforce
预算/时间线：
- 预算：希望先做 POC，预算大概 5-10 万 RMB
- 时间线：希望 2 周内给 POC 原型，1-2 个月内小范围试点上线
参与方：CEO、财务、销售总监
Nice-to-have：
- 可做成简单 bot（非必须）
";

    const VAGUE_CHAT: &str = "我们想搞个东西，现在销售那边节奏很乱，领导也经常说看不到数据，
想做个 CRM 类的东西，每次开完会后总结都没人写，跟进提醒也没有，越快越好吧。";

    fn extract(text: &str) -> LeadProfile {
        RuleBasedExtractor::new().extract(text)
    }

    #[test]
    fn structured_notes_fill_every_field() {
        let profile = extract(STRUCTURED_NOTES);

        assert_eq!(profile.account_name, "华东医疗科技有限公司");
        assert_eq!(profile.industry, "医疗器械");
        assert_eq!(profile.business_model, "B2B");
        assert_eq!(profile.budget, "希望先做 POC，预算大概 5-10 万 RMB");
        assert!(profile.timeline.contains("2 周内"));
        assert_eq!(profile.stakeholders, vec!["CEO", "财务", "销售总监"]);
        assert!(profile.must_haves.contains(&"Salesforce".to_string()));
        assert!(profile.pain_points.contains(&"漏跟进".to_string()));
        assert_eq!(profile.nice_to_haves, vec!["bot"]);
        assert!(!profile.must_haves.contains(&"bot".to_string()));
        assert!(profile.open_questions.is_empty(), "{:?}", profile.open_questions);
    }

    #[test]
    fn english_sentence_yields_currency_budget_and_quarter_timeline() {
        let profile = extract("Budget is $50k, need this by Q3, contact [REDACTED_EMAIL]");

        assert_eq!(profile.budget, "$50k");
        assert!(profile.timeline.contains("Q3"));
        assert_eq!(profile.account_name, UNKNOWN);
        assert_eq!(profile.industry, UNKNOWN);
        assert_eq!(profile.must_haves, vec![UNKNOWN]);
    }

    #[test]
    fn vague_chat_infers_b2b_and_asks_about_crm() {
        let profile = extract(VAGUE_CHAT);

        assert_eq!(profile.account_name, UNKNOWN);
        assert_eq!(profile.business_model, INFERRED_B2B);
        assert_eq!(profile.timeline, URGENT_TIMELINE);
        assert_eq!(profile.use_case, USE_CASE_REPORTING);
        assert!(profile.stakeholders.iter().any(|role| role == REPORTING_STAKEHOLDER));
        assert!(profile.open_questions.iter().any(|question| question == QUESTION_COMPANY));
        assert!(profile.open_questions.iter().any(|question| question == QUESTION_BUSINESS_MODEL));
        assert!(profile.open_questions.iter().any(|question| question == QUESTION_CRM));
    }

    #[test]
    fn negated_crm_does_not_trigger_crm_question() {
        let profile = extract("我们目前没有用 CRM，需要自动化提醒，B2B 客户为主");

        assert_eq!(profile.business_model, "B2B");
        assert!(profile.must_haves.contains(&"CRM".to_string()));
        assert!(!profile.open_questions.iter().any(|question| question == QUESTION_CRM));
    }

    #[test]
    fn invoice_mentions_set_invoice_use_case() {
        let profile = extract("Need invoice validation inside the sales workflow");

        assert_eq!(profile.use_case, USE_CASE_INVOICE);
    }

    #[test]
    fn empty_text_degrades_to_unknown_everywhere() {
        let profile = extract("");

        assert_eq!(profile.account_name, UNKNOWN);
        assert_eq!(profile.industry, UNKNOWN);
        assert_eq!(profile.business_model, UNKNOWN);
        assert_eq!(profile.use_case, UNKNOWN);
        assert_eq!(profile.budget, UNKNOWN);
        assert_eq!(profile.timeline, UNKNOWN);
        assert_eq!(profile.pain_points, vec![UNKNOWN]);
        assert_eq!(profile.stakeholders, vec![UNKNOWN]);
        assert!(profile.nice_to_haves.is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        assert_eq!(extract(STRUCTURED_NOTES), extract(STRUCTURED_NOTES));
        assert_eq!(extract(VAGUE_CHAT), extract(VAGUE_CHAT));
    }

    #[test]
    fn company_guard_rejects_conversational_fragments() {
        assert!(looks_like_company_name("华东医疗科技有限公司"));
        assert!(looks_like_company_name("Acme Robotics Inc."));
        assert!(!looks_like_company_name("我们想搞个公司"));
        assert!(!looks_like_company_name("Zinc"));
        assert!(!looks_like_company_name("公司"));
    }

    #[test]
    fn crm_mentioned_inside_chinese_text_drives_inference_and_question() {
        let profile = extract("老板想做CRM，现在全靠手动");

        assert_eq!(profile.business_model, INFERRED_B2B);
        assert!(profile.must_haves.contains(&"CRM".to_string()));
        assert!(profile.open_questions.iter().any(|question| question == QUESTION_CRM));
    }

    #[test]
    fn named_crm_inside_chinese_text_skips_the_crm_question() {
        let profile = extract("我们用Salesforce管理客户，想做CRM自动化，需要dashboard");

        assert!(profile.must_haves.contains(&"Salesforce".to_string()));
        assert!(profile.open_questions.iter().all(|question| question != QUESTION_CRM));
    }
}
