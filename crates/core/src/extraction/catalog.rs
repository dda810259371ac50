use once_cell::sync::Lazy;
use regex::Regex;

pub const PAIN_POINT_KEYWORDS: &[&str] = &[
    "手动",
    "低效",
    "遗漏",
    "数据不一致",
    "分散",
    "节奏很乱",
    "未跟进",
    "不太爱填",
    "很乱",
    "manual",
    "slow",
    "漏跟进",
    "麻烦",
    "inefficient",
    "spreadsheets",
    "error-prone",
];

pub const MUST_HAVE_KEYWORDS: &[&str] = &[
    "自动化",
    "workflow",
    "tracking",
    "数据追踪",
    "CRM",
    "Salesforce",
    "发票",
    "invoice",
    "dashboard",
    "提醒",
    "超过48小时未跟进",
    "会后总结",
    "复盘",
    "英文",
    "email",
    "邮箱",
    "WhatsApp",
    "微信",
    "导出 Excel/CSV",
    "导出Excel/CSV",
    "automation",
    "reporting",
];

pub const NICE_TO_HAVE_KEYWORDS: &[&str] =
    &["同步", "集成", "导出", "Slack", "企微", "飞书", "小程序", "bot", "integration", "sync"];

pub const STAKEHOLDER_KEYWORDS: &[&str] = &[
    "CEO",
    "CTO",
    "CFO",
    "COO",
    "VP",
    "采购",
    "财务",
    "运营",
    "销售总监",
    "老板",
    "procurement",
    "finance",
    "ops",
    "sales",
];

/// Consulted only when no role from [`STAKEHOLDER_KEYWORDS`] is present.
pub const LEADERSHIP_KEYWORDS: &[&str] =
    &["领导", "管理层", "总监", "management", "manager", "director"];

pub const REPORTING_STAKEHOLDER: &str = "领导/管理层（Reporting stakeholder）";

pub static PAIN_POINTS: Lazy<KeywordCatalog> = Lazy::new(|| KeywordCatalog::new(PAIN_POINT_KEYWORDS));
pub static MUST_HAVES: Lazy<KeywordCatalog> = Lazy::new(|| KeywordCatalog::new(MUST_HAVE_KEYWORDS));
pub static NICE_TO_HAVES: Lazy<KeywordCatalog> =
    Lazy::new(|| KeywordCatalog::new(NICE_TO_HAVE_KEYWORDS));
pub static STAKEHOLDERS: Lazy<KeywordCatalog> =
    Lazy::new(|| KeywordCatalog::new(STAKEHOLDER_KEYWORDS));
pub static LEADERSHIP: Lazy<KeywordCatalog> = Lazy::new(|| KeywordCatalog::new(LEADERSHIP_KEYWORDS));

/// Ordered keyword list with one compiled matcher per entry.
///
/// ASCII keywords match on ASCII word boundaries, so `email` does not fire on the
/// `[REDACTED_EMAIL]` placeholder and `ops` does not fire inside `shops`, while `做CRM` still
/// counts. CJK keywords match as plain substrings.
pub struct KeywordCatalog {
    entries: Vec<(&'static str, Regex)>,
}

impl KeywordCatalog {
    pub fn new(keywords: &'static [&'static str]) -> Self {
        let entries = keywords
            .iter()
            .map(|keyword| {
                let escaped = regex::escape(keyword);
                let pattern = if keyword.is_ascii() {
                    format!(r"(?i)(?-u:\b){escaped}(?-u:\b)")
                } else {
                    format!("(?i){escaped}")
                };
                (*keyword, Regex::new(&pattern).expect("escaped keyword pattern"))
            })
            .collect();
        Self { entries }
    }

    /// Keywords found in `text`, in catalog order, each at most once.
    pub fn matches(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for (keyword, pattern) in &self.entries {
            if pattern.is_match(text) && !found.iter().any(|existing| existing == keyword) {
                found.push((*keyword).to_string());
            }
        }
        found
    }
}
