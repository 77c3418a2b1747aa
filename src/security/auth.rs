//! Capability checks consumed by the domain layer.

use serde_json::Value;
use thiserror::Error;

/// Errors returned by an [`Authorizator`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Policy refused the operation.
    #[error("{operation} {entity} denied: {reason}")]
    Denied {
        operation: &'static str,
        entity: &'static str,
        reason: String,
    },
}

impl AuthError {
    pub fn denied(operation: &'static str, entity: &dyn Entity, reason: impl Into<String>) -> Self {
        Self::Denied {
            operation,
            entity: entity.kind(),
            reason: reason.into(),
        }
    }
}

/// Anything a policy can reason about.
pub trait Entity {
    /// Short lowercase entity name, e.g. `cardholder`.
    fn kind(&self) -> &'static str;

    /// Attribute view evaluated by policies.
    fn attributes(&self) -> Value;
}

/// Capability checks for state-changing operations.
///
/// A returned error is a denial and surfaces to the client as `403 Forbidden`.
pub trait Authorizator: Send + Sync {
    fn can_add(&self, entity: &dyn Entity) -> Result<(), AuthError>;

    fn can_update(&self, original: &dyn Entity, updated: &dyn Entity) -> Result<(), AuthError>;

    fn can_delete(&self, entity: &dyn Entity) -> Result<(), AuthError>;
}
