//! Group membership rules.

use thiserror::Error;

use crate::config::SharedConfig;
use crate::domain::cardholders::CardHolder;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule evaluation failed for card {card}: {reason}")]
    Evaluation { card: u64, reason: String },
}

/// Computes the groups a card holder belongs to.
pub trait RuleEvaluator: Send + Sync {
    fn eval(&self, holder: &CardHolder) -> Result<Vec<String>, RuleError>;
}

/// Card-range rules from the `[[rules.groups]]` config section.
pub struct GroupRules {
    config: SharedConfig,
}

impl GroupRules {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }
}

impl RuleEvaluator for GroupRules {
    fn eval(&self, holder: &CardHolder) -> Result<Vec<String>, RuleError> {
        let config = self.config.load();
        let mut groups: Vec<String> = config
            .rules
            .groups
            .iter()
            .filter(|rule| (rule.min_card..=rule.max_card).contains(&holder.card))
            .map(|rule| rule.name.clone())
            .collect();
        groups.sort();
        groups.dedup();
        Ok(groups)
    }
}
