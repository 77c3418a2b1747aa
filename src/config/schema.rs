//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the access gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Operation deadlines.
    pub timeouts: TimeoutConfig,

    /// Response compression.
    pub compression: CompressionConfig,

    /// Audit queue settings.
    pub audit: AuditConfig,

    /// Authorization policy settings.
    pub auth: AuthConfig,

    /// Group membership rules.
    pub rules: RulesConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Deadlines for domain operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Default operation deadline in milliseconds.
    pub operation_ms: u64,

    /// Per-endpoint overrides in milliseconds, keyed by endpoint name
    /// (e.g. `"cardholders.add"`).
    pub endpoints: HashMap<String, u64>,
}

impl TimeoutConfig {
    /// Deadline for the named endpoint.
    pub fn deadline_for(&self, endpoint: &str) -> Duration {
        let ms = self.endpoints.get(endpoint).copied().unwrap_or(self.operation_ms);
        Duration::from_millis(ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            operation_ms: 5_000,
            endpoints: HashMap::new(),
        }
    }
}

/// Response compression configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompressionConfig {
    /// Bodies no longer than this are always sent uncompressed.
    pub min_gzip_bytes: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            min_gzip_bytes: 1024,
        }
    }
}

/// Audit trail configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Bounded queue capacity. Entries beyond it are dropped.
    pub queue_capacity: usize,

    /// Optional JSON-lines file. Entries go to the log when unset.
    pub file: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            file: None,
        }
    }
}

/// Authorization policy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Card numbers below this are rejected.
    pub min_card_number: u64,

    /// Whether card holders may be deleted.
    pub allow_delete: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_card_number: 1_000_000,
            allow_delete: true,
        }
    }
}

/// Group membership rules.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RulesConfig {
    pub groups: Vec<GroupRule>,
}

/// Assigns `name` to every card in `[min_card, max_card]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GroupRule {
    pub name: String,
    pub min_card: u64,
    pub max_card: u64,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
