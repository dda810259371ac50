use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::Serialize;

pub const EMAIL_PLACEHOLDER: &str = "[REDACTED_EMAIL]";
pub const PHONE_PLACEHOLDER: &str = "[REDACTED_PHONE]";
pub const NATIONAL_ID_PLACEHOLDER: &str = "[REDACTED_ID]";

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?-u:\b)[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}(?-u:\b)").expect("email regex")
});

// 18-character resident ID; runs before the phone pass so its digits are not split.
static NATIONAL_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?-u:\b)\d{17}[\dXx](?-u:\b)").expect("national id regex"));

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\+?86[-\s]?1[3-9]\d{9}(?-u:\b)|(?-u:\b)1[3-9]\d{9}(?-u:\b)|(?:\+\d{1,3}[-.\s]?)?(?:\(\d{3}\)|(?-u:\b)\d{3})[-.\s]?\d{3}[-.\s]?\d{4}(?-u:\b)",
    )
    .expect("phone regex")
});

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RedactionCounts {
    pub emails: usize,
    pub phones: usize,
    pub national_ids: usize,
}

impl RedactionCounts {
    pub fn total(&self) -> usize {
        self.emails + self.phones + self.national_ids
    }

    pub fn any(&self) -> bool {
        self.total() > 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedactionOutcome {
    pub text: String,
    pub counts: RedactionCounts,
}

/// Best-effort scrub of contact details and ID numbers. Unmatched text passes through unchanged.
pub fn redact(text: &str) -> RedactionOutcome {
    let (text, emails) = replace_all(&EMAIL_RE, text, EMAIL_PLACEHOLDER);
    let (text, national_ids) = replace_all(&NATIONAL_ID_RE, &text, NATIONAL_ID_PLACEHOLDER);
    let (text, phones) = replace_all(&PHONE_RE, &text, PHONE_PLACEHOLDER);

    RedactionOutcome { text, counts: RedactionCounts { emails, phones, national_ids } }
}

fn replace_all(pattern: &Regex, text: &str, placeholder: &str) -> (String, usize) {
    let hits = pattern.find_iter(text).count();
    if hits == 0 {
        return (text.to_string(), 0);
    }
    (pattern.replace_all(text, NoExpand(placeholder)).into_owned(), hits)
}

#[cfg(test)]
mod tests {
    use super::{redact, EMAIL_PLACEHOLDER, NATIONAL_ID_PLACEHOLDER, PHONE_PLACEHOLDER};

    #[test]
    fn emails_are_replaced_case_insensitively() {
        let outcome = redact("contact John.Doe@Example.COM or ops@acme.io today");

        assert!(!outcome.text.contains("John.Doe@Example.COM"));
        assert!(!outcome.text.contains("ops@acme.io"));
        assert_eq!(outcome.text.matches(EMAIL_PLACEHOLDER).count(), 2);
        assert_eq!(outcome.counts.emails, 2);
    }

    #[test]
    fn phone_numbers_in_common_layouts_are_replaced() {
        let samples = [
            "call 13812345678 tomorrow",
            "call +86 13812345678 tomorrow",
            "call 555-123-4567 tomorrow",
            "call (555) 123-4567 tomorrow",
            "call +1 555.123.4567 tomorrow",
        ];

        for sample in samples {
            let outcome = redact(sample);
            assert!(outcome.text.contains(PHONE_PLACEHOLDER), "not redacted: {sample}");
            assert!(
                !outcome.text.chars().any(|c| c.is_ascii_digit()),
                "digits survived in {sample}: {}",
                outcome.text
            );
            assert_eq!(outcome.counts.phones, 1);
        }
    }

    #[test]
    fn national_id_numbers_get_their_own_placeholder() {
        let outcome = redact("身份证 11010519491231002X 已提供");

        assert!(outcome.text.contains(NATIONAL_ID_PLACEHOLDER));
        assert!(!outcome.text.contains(PHONE_PLACEHOLDER));
        assert_eq!(outcome.counts.national_ids, 1);
        assert_eq!(outcome.counts.phones, 0);
    }

    #[test]
    fn text_without_pii_passes_through_unchanged() {
        let text = "Budget is $50k, need this by Q3. 预算：5-10 万 RMB";
        let outcome = redact(text);

        assert_eq!(outcome.text, text);
        assert!(!outcome.counts.any());
    }

    #[test]
    fn literals_glued_to_chinese_text_are_still_replaced() {
        let outcome = redact("联系john@example.com谢谢，手机13812345678请回电，身份证11010519491231002X已提供");

        assert_eq!(
            outcome.text,
            "联系[REDACTED_EMAIL]谢谢，手机[REDACTED_PHONE]请回电，身份证[REDACTED_ID]已提供"
        );
        assert_eq!(outcome.counts.emails, 1);
        assert_eq!(outcome.counts.phones, 1);
        assert_eq!(outcome.counts.national_ids, 1);
        assert_eq!(redact("电话13812345678").text, "电话[REDACTED_PHONE]");
    }
}
