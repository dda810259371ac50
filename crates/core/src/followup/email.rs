use serde::Serialize;
use tera::{Context, Tera};

use crate::config::EmailLanguage;
use crate::domain::lead::LeadProfile;

const PRIMARY_TEMPLATE: &str = "primary.txt";
const BILINGUAL_TEMPLATE: &str = "bilingual.txt";

/// Number of recommended actions quoted in the email body.
pub const EMAIL_ACTION_LIMIT: usize = 3;

#[derive(Debug, Serialize)]
struct Fact {
    label: &'static str,
    value: String,
}

/// Renders the follow-up email from embedded tera templates.
#[derive(Clone, Debug)]
pub struct FollowUpComposer {
    tera: Tera,
}

impl FollowUpComposer {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(
            PRIMARY_TEMPLATE,
            include_str!("../../../../templates/email/primary.txt.tera"),
        )?;
        tera.add_raw_template(
            BILINGUAL_TEMPLATE,
            include_str!("../../../../templates/email/bilingual.txt.tera"),
        )?;
        Ok(Self { tera })
    }

    pub fn compose(
        &self,
        profile: &LeadProfile,
        actions: &[String],
        owner: &str,
        language: EmailLanguage,
    ) -> Result<String, tera::Error> {
        let (template, no_questions) = match language {
            EmailLanguage::Primary => (PRIMARY_TEMPLATE, "- 暂无"),
            EmailLanguage::Bilingual => (BILINGUAL_TEMPLATE, "- None for now / 暂无"),
        };

        let question_lines = if profile.open_questions.is_empty() {
            vec![no_questions.to_string()]
        } else {
            profile.open_questions.iter().map(|question| format!("- {question}")).collect()
        };
        let quoted_actions = &actions[..actions.len().min(EMAIL_ACTION_LIMIT)];

        let mut context = Context::new();
        context.insert("facts", &key_facts(profile));
        context.insert("actions", quoted_actions);
        context.insert("question_lines", &question_lines);
        context.insert("owner", owner);

        let rendered = self.tera.render(template, &context)?;
        Ok(rendered.trim().to_string())
    }
}

fn key_facts(profile: &LeadProfile) -> Vec<Fact> {
    let nice_to_haves = if profile.nice_to_haves.is_empty() {
        "None".to_string()
    } else {
        profile.nice_to_haves.join(", ")
    };

    vec![
        Fact { label: "行业/Industry", value: profile.industry.clone() },
        Fact { label: "业务类型/Segment", value: profile.business_model.clone() },
        Fact { label: "痛点/Pain points", value: profile.pain_points.join(", ") },
        Fact { label: "关键需求/Must-haves", value: profile.must_haves.join(", ") },
        Fact { label: "可选项/Nice-to-haves", value: nice_to_haves },
        Fact { label: "预算/Budget", value: profile.budget.clone() },
        Fact { label: "时间线/Timeline", value: profile.timeline.clone() },
    ]
}
