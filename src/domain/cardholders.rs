//! Card holder records.

use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use crate::audit::{AuditEntry, AuditSink};
use crate::domain::fields::{self, Fields};
use crate::error::GateError;
use crate::security::{Authorizator, Entity};

const MODULE: &str = "cardholders";

/// A card and the person holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardHolder {
    pub card: u64,
    pub name: String,
    pub groups: Vec<String>,
}

impl Entity for CardHolder {
    fn kind(&self) -> &'static str {
        "cardholder"
    }

    fn attributes(&self) -> Value {
        json!({ "card": self.card, "name": self.name, "groups": self.groups })
    }
}

/// Thread-safe card holder store.
pub struct CardHolders {
    records: DashMap<u64, CardHolder>,
    auth: Arc<dyn Authorizator>,
    audit: AuditSink,
    /// Artificial storage latency, used to exercise deadlines.
    latency: Duration,
}

impl CardHolders {
    pub fn new(auth: Arc<dyn Authorizator>, audit: AuditSink) -> Self {
        Self {
            records: DashMap::new(),
            auth,
            audit,
            latency: Duration::ZERO,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// All card holders ordered by card number.
    pub fn list(&self) -> Vec<CardHolder> {
        let mut all: Vec<_> = self.records.iter().map(|r| r.value().clone()).collect();
        all.sort_by_key(|c| c.card);
        all
    }

    pub fn get(&self, card: u64) -> Option<CardHolder> {
        self.records.get(&card).map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace derived group membership. Not audited.
    pub fn set_groups(&self, card: u64, groups: Vec<String>) -> bool {
        match self.records.get_mut(&card) {
            Some(mut record) => {
                record.groups = groups;
                true
            }
            None => false,
        }
    }

    /// Add a card holder from `{"card": <u64>, "name": <string>?}`.
    pub async fn add(
        &self,
        actor: &str,
        fields: Fields,
        token: CancellationToken,
    ) -> Result<Vec<CardHolder>, GateError> {
        fields::only(&fields, &["card", "name"])?;
        let record = CardHolder {
            card: fields::required_u64(&fields, "card")?,
            name: fields::optional_str(&fields, "name")?.unwrap_or_default().to_string(),
            groups: Vec::new(),
        };

        self.storage_io(&token).await?;
        self.auth.can_add(&record)?;
        commit_point(&token)?;

        match self.records.entry(record.card) {
            MapEntry::Occupied(_) => {
                return Err(GateError::InvalidRequest(format!("card {} already exists", record.card)));
            }
            MapEntry::Vacant(slot) => {
                slot.insert(record.clone());
            }
        }

        tracing::info!(card = record.card, actor, "Card holder added");
        self.audit.write(AuditEntry::new(actor, MODULE, "add", record.attributes()));
        Ok(self.list())
    }

    /// Update or delete a card holder.
    ///
    /// `{"card": <u64>, "name": <string>?}` renames; `{"card": <u64>, "deleted": true}`
    /// deletes.
    pub async fn update(
        &self,
        actor: &str,
        fields: Fields,
        token: CancellationToken,
    ) -> Result<Vec<CardHolder>, GateError> {
        fields::only(&fields, &["card", "name", "deleted"])?;
        let card = fields::required_u64(&fields, "card")?;
        let original = self
            .get(card)
            .ok_or_else(|| GateError::NotFound(format!("card {card}")))?;

        if fields::optional_bool(&fields, "deleted")?.unwrap_or(false) {
            self.storage_io(&token).await?;
            self.auth.can_delete(&original)?;
            commit_point(&token)?;

            if self.records.remove(&card).is_none() {
                return Err(GateError::NotFound(format!("card {card}")));
            }
            tracing::info!(card, actor, "Card holder deleted");
            self.audit.write(AuditEntry::new(actor, MODULE, "delete", original.attributes()));
            return Ok(self.list());
        }

        let mut updated = original.clone();
        if let Some(name) = fields::optional_str(&fields, "name")? {
            updated.name = name.to_string();
        }

        self.storage_io(&token).await?;
        self.auth.can_update(&original, &updated)?;
        commit_point(&token)?;

        match self.records.get_mut(&card) {
            Some(mut record) => record.name = updated.name.clone(),
            None => return Err(GateError::NotFound(format!("card {card}"))),
        }

        tracing::info!(card, actor, "Card holder updated");
        self.audit.write(AuditEntry::new(
            actor,
            MODULE,
            "update",
            json!({ "original": original.attributes(), "updated": updated.attributes() }),
        ));
        Ok(self.list())
    }

    /// Simulated storage round trip. Bails out once the caller has given up.
    async fn storage_io(&self, token: &CancellationToken) -> Result<(), GateError> {
        tokio::select! {
            biased;

            _ = token.cancelled() => Err(GateError::Cancelled),
            _ = tokio::time::sleep(self.latency) => Ok(()),
        }
    }
}

/// Last check before state changes. Nothing between it and the write yields.
fn commit_point(token: &CancellationToken) -> Result<(), GateError> {
    if token.is_cancelled() {
        return Err(GateError::Cancelled);
    }
    Ok(())
}
