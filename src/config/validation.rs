//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadlines > 0, capacities > 0)
//! - Check rule definitions are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GateConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("{0} must be greater than zero")]
    Zero(String),

    #[error("rules.groups[{0}] has an empty name")]
    EmptyGroupName(usize),

    #[error("rules.groups[{index}] ({name}) has min_card > max_card")]
    InvertedRange { index: usize, name: String },

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.timeouts.operation_ms == 0 {
        errors.push(ValidationError::Zero("timeouts.operation_ms".into()));
    }
    let mut endpoints: Vec<_> = config.timeouts.endpoints.iter().collect();
    endpoints.sort();
    for (name, ms) in endpoints {
        if *ms == 0 {
            errors.push(ValidationError::Zero(format!("timeouts.endpoints.{name}")));
        }
    }

    if config.audit.queue_capacity == 0 {
        errors.push(ValidationError::Zero("audit.queue_capacity".into()));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::Zero("security.max_body_size".into()));
    }

    for (index, rule) in config.rules.groups.iter().enumerate() {
        if rule.name.trim().is_empty() {
            errors.push(ValidationError::EmptyGroupName(index));
        }
        if rule.min_card > rule.max_card {
            errors.push(ValidationError::InvertedRange {
                index,
                name: rule.name.clone(),
            });
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(config.observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
