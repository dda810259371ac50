pub mod catalog;
pub mod external;
pub mod rules;

use crate::config::{ExtractionConfig, ExtractionStrategyKind};
use crate::domain::lead::LeadProfile;

pub use external::{CompletionError, ExternalExtractor, LlmClient, OfflineLlmClient};
pub use rules::RuleBasedExtractor;

/// Turns (already redacted) customer text into a lead profile. Implementations never fail:
/// anything they cannot recover is reported with the unknown marker.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, text: &str) -> LeadProfile;
}

/// Builds the strategy selected by `extraction.strategy`.
pub fn strategy_from_config(config: &ExtractionConfig) -> Box<dyn ExtractionStrategy> {
    match config.strategy {
        ExtractionStrategyKind::RuleBased => Box::new(RuleBasedExtractor::new()),
        ExtractionStrategyKind::External => {
            Box::new(ExternalExtractor::new(OfflineLlmClient))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::strategy_from_config;
    use crate::config::{AppConfig, ExtractionStrategyKind};

    #[test]
    fn configured_kind_selects_matching_strategy() {
        let mut config = AppConfig::default().extraction;
        assert_eq!(strategy_from_config(&config).name(), "rule_based");

        config.strategy = ExtractionStrategyKind::External;
        assert_eq!(strategy_from_config(&config).name(), "external");
    }

    #[test]
    fn offline_external_strategy_matches_rule_based_output() {
        let mut config = AppConfig::default().extraction;
        let text = "预算：20 万 RMB，时间线：下月上线，需要 CRM 自动化";
        let rule_based = strategy_from_config(&config).extract(text);

        config.strategy = ExtractionStrategyKind::External;
        assert_eq!(strategy_from_config(&config).extract(text), rule_based);
    }
}
