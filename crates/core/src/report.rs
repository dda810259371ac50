use crate::domain::lead::LeadFields;
use crate::domain::score::Scores;

/// Renders `report.md`. Pure formatting; section order is fixed.
pub fn render_report(fields: &LeadFields, scores: &Scores, actions: &[String], email: &str) -> String {
    let profile = &fields.profile;
    let mut lines = vec![
        "# Lead Summary\n".to_string(),
        format!("- **Lead ID**: {}", fields.lead_id),
        format!("- **Account**: {}", profile.account_name),
        format!("- **Industry**: {}", profile.industry),
        format!("- **Business model**: {}", profile.business_model),
        format!("- **Use case**: {}", profile.use_case),
        format!("- **Budget**: {}", profile.budget),
        format!("- **Timeline**: {}", profile.timeline),
        format!("- **Pain points**: {}", profile.pain_points.join(", ")),
        format!("- **Must-haves**: {}", profile.must_haves.join(", ")),
        format!("- **Stakeholders**: {}", profile.stakeholders.join(", ")),
        format!("- **Source**: {}", fields.source),
        format!("- **PII redacted**: {}", fields.pii_redacted),
        format!("- **Text hash**: `{}`\n", fields.text_hash),
        "## Scores\n".to_string(),
        format!("- **Fit score**: {}", scores.fit_score),
        format!("- **Intent score**: {}", scores.intent_score),
        format!("- **Stage**: {}", scores.stage),
        format!("- **Rating**: {}\n", scores.rating.as_str()),
        "## Next actions\n".to_string(),
    ];
    lines.extend(actions.iter().map(|action| format!("- {action}")));

    lines.push("\n## Follow-up email\n".to_string());
    lines.push("```".to_string());
    lines.push(email.to_string());
    lines.push("```".to_string());

    if !profile.open_questions.is_empty() {
        lines.push("\n## Open questions\n".to_string());
        lines.extend(profile.open_questions.iter().map(|question| format!("- {question}")));
    }

    lines.join("\n").trim().to_string()
}
