//! Concrete authorization policies.

use crate::config::SharedConfig;
use crate::security::auth::{AuthError, Authorizator, Entity};

/// Permits everything. Useful for local development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizator for AllowAll {
    fn can_add(&self, _entity: &dyn Entity) -> Result<(), AuthError> {
        Ok(())
    }

    fn can_update(&self, _original: &dyn Entity, _updated: &dyn Entity) -> Result<(), AuthError> {
        Ok(())
    }

    fn can_delete(&self, _entity: &dyn Entity) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Card-number policy driven by the `[auth]` config section.
///
/// Reads the live config on every check so reloads apply immediately.
pub struct CardPolicy {
    config: SharedConfig,
}

impl CardPolicy {
    pub fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    fn check_card(&self, operation: &'static str, entity: &dyn Entity) -> Result<(), AuthError> {
        let Some(card) = entity.attributes().get("card").and_then(|v| v.as_u64()) else {
            return Err(AuthError::denied(operation, entity, "no card number to check"));
        };

        let min = self.config.load().auth.min_card_number;
        if card < min {
            return Err(AuthError::denied(
                operation,
                entity,
                format!("sorry compadre, card {card} is below the permitted minimum {min}"),
            ));
        }
        Ok(())
    }
}

impl Authorizator for CardPolicy {
    fn can_add(&self, entity: &dyn Entity) -> Result<(), AuthError> {
        self.check_card("add", entity)
    }

    fn can_update(&self, original: &dyn Entity, updated: &dyn Entity) -> Result<(), AuthError> {
        let before = original.attributes();
        let after = updated.attributes();
        if before.get("card") != after.get("card") {
            return Err(AuthError::denied("update", updated, "card number is immutable"));
        }
        self.check_card("update", updated)
    }

    fn can_delete(&self, entity: &dyn Entity) -> Result<(), AuthError> {
        if !self.config.load().auth.allow_delete {
            return Err(AuthError::denied("delete", entity, "deletes are disabled"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{shared, GateConfig};
    use serde_json::{json, Value};

    struct Card(u64);

    impl Entity for Card {
        fn kind(&self) -> &'static str {
            "cardholder"
        }

        fn attributes(&self) -> Value {
            json!({ "card": self.0 })
        }
    }

    #[test]
    fn test_min_card_number() {
        let mut config = GateConfig::default();
        config.auth.min_card_number = 1_000_000;
        let policy = CardPolicy::new(shared(config));

        assert!(policy.can_add(&Card(6_000_001)).is_ok());
        let err = policy.can_add(&Card(100)).unwrap_err();
        assert!(err.to_string().contains("card 100"));
    }

    struct Badge;

    impl Entity for Badge {
        fn kind(&self) -> &'static str {
            "badge"
        }

        fn attributes(&self) -> Value {
            json!({ "name": "visitor" })
        }
    }

    #[test]
    fn test_entity_without_card_is_denied() {
        let policy = CardPolicy::new(shared(GateConfig::default()));

        assert!(policy.can_add(&Badge).is_err());
        assert!(policy.can_update(&Badge, &Badge).is_err());
    }

    #[test]
    fn test_card_number_is_immutable() {
        let policy = CardPolicy::new(shared(GateConfig::default()));

        assert!(policy.can_update(&Card(6_000_001), &Card(6_000_001)).is_ok());
        assert!(policy.can_update(&Card(6_000_001), &Card(6_000_002)).is_err());
    }

    #[test]
    fn test_policy_follows_reloaded_config() {
        let config = shared(GateConfig::default());
        let policy = CardPolicy::new(config.clone());
        assert!(policy.can_delete(&Card(6_000_001)).is_ok());

        let mut next = GateConfig::default();
        next.auth.allow_delete = false;
        config.store(std::sync::Arc::new(next));

        assert!(policy.can_delete(&Card(6_000_001)).is_err());
    }
}
