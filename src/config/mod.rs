//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GateConfig (validated)
//!     → shared via Arc<ArcSwap<GateConfig>> to handlers and policies
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server swaps the new config in atomically
//!     → next request observes new deadlines, thresholds, policy
//! ```
//!
//! # Design Decisions
//! - A loaded config is never mutated; reload replaces it whole
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - The listener address is read once at startup

use std::sync::Arc;

use arc_swap::ArcSwap;

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AuditConfig, AuthConfig, CompressionConfig, GateConfig, GroupRule, ListenerConfig,
    ObservabilityConfig, RulesConfig, SecurityConfig, TimeoutConfig,
};
pub use validation::ValidationError;
pub use watcher::ConfigWatcher;

/// Live configuration handle shared by every subsystem that honours reloads.
pub type SharedConfig = Arc<ArcSwap<GateConfig>>;

/// Wrap a config in a [`SharedConfig`].
pub fn shared(config: GateConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}
