//! System-wide settings.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditEntry, AuditSink};
use crate::domain::cardholders::CardHolders;
use crate::domain::fields::{self, Fields};
use crate::error::GateError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    name: String,
    description: String,
}

/// Snapshot returned by `GET /system`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub name: String,
    pub description: String,
    pub version: String,
    pub cardholders: usize,
}

pub struct System {
    settings: ArcSwap<Settings>,
    cardholders: Arc<CardHolders>,
    audit: AuditSink,
}

impl System {
    pub fn new(cardholders: Arc<CardHolders>, audit: AuditSink) -> Self {
        Self {
            settings: ArcSwap::from_pointee(Settings {
                name: "card-gate".to_string(),
                description: String::new(),
            }),
            cardholders,
            audit,
        }
    }

    pub fn get(&self) -> SystemInfo {
        let settings = self.settings.load();
        SystemInfo {
            name: settings.name.clone(),
            description: settings.description.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            cardholders: self.cardholders.len(),
        }
    }

    /// Apply `{"name": <string>?, "description": <string>?}`.
    pub async fn update(
        &self,
        actor: &str,
        fields: Fields,
        token: CancellationToken,
    ) -> Result<SystemInfo, GateError> {
        fields::only(&fields, &["name", "description"])?;
        let name = fields::optional_str(&fields, "name")?;
        let description = fields::optional_str(&fields, "description")?;
        if name == Some("") {
            return Err(GateError::InvalidRequest("name must not be blank".into()));
        }

        if token.is_cancelled() {
            return Err(GateError::Cancelled);
        }

        let previous = self.settings.rcu(|current| {
            let mut next = Settings::clone(current);
            if let Some(name) = name {
                next.name = name.to_string();
            }
            if let Some(description) = description {
                next.description = description.to_string();
            }
            next
        });

        let info = self.get();
        self.audit.write(AuditEntry::new(
            actor,
            "system",
            "update",
            json!({
                "original": { "name": previous.name, "description": previous.description },
                "updated": { "name": info.name, "description": info.description },
            }),
        ));
        Ok(info)
    }
}
