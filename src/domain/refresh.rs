//! Recomputes derived access state after card holder changes.

use std::sync::Arc;

use crate::domain::cardholders::CardHolders;
use crate::domain::rules::RuleEvaluator;
use crate::http::handler::SuccessHook;

/// Success hook that re-evaluates group membership for every card holder.
///
/// Runs on a background task; the response that triggered it is not delayed.
#[derive(Clone)]
pub struct AclRefresh {
    cardholders: Arc<CardHolders>,
    rules: Arc<dyn RuleEvaluator>,
}

impl AclRefresh {
    pub fn new(cardholders: Arc<CardHolders>, rules: Arc<dyn RuleEvaluator>) -> Self {
        Self { cardholders, rules }
    }

    /// Re-evaluate every card holder. Returns the number whose groups changed.
    pub fn refresh(&self) -> usize {
        let mut changed = 0;
        for holder in self.cardholders.list() {
            match self.rules.eval(&holder) {
                Ok(groups) if groups != holder.groups => {
                    if self.cardholders.set_groups(holder.card, groups) {
                        changed += 1;
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, card = holder.card, "Rule evaluation failed"),
            }
        }
        changed
    }
}

impl SuccessHook for AclRefresh {
    fn on_success(&self, endpoint: &'static str) {
        if !endpoint.starts_with("cardholders.") {
            return;
        }
        let refresh = self.clone();
        tokio::spawn(async move {
            let changed = refresh.refresh();
            tracing::debug!(endpoint, changed, "ACL refreshed");
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditTrail, MemoryWriter};
    use crate::config::{shared, GateConfig, GroupRule};
    use crate::domain::rules::GroupRules;
    use crate::security::AllowAll;
    use serde_json::json;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_refresh_assigns_groups() {
        let mut config = GateConfig::default();
        config.rules.groups.push(GroupRule {
            name: "staff".into(),
            min_card: 6_000_000,
            max_card: 6_999_999,
        });
        let trail = AuditTrail::new(8, MemoryWriter::new());
        let cards = Arc::new(CardHolders::new(Arc::new(AllowAll), trail.sink()));
        let body = match json!({ "card": 6000001 }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        cards.add("a", body, CancellationToken::new()).await.unwrap();

        let refresh = AclRefresh::new(cards.clone(), Arc::new(GroupRules::new(shared(config))));
        assert_eq!(refresh.refresh(), 1);
        assert_eq!(cards.get(6000001).unwrap().groups, vec!["staff"]);
        // idempotent
        assert_eq!(refresh.refresh(), 0);
    }
}
