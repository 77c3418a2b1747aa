//! Audit trail subsystem.
//!
//! # Data Flow
//! ```text
//! Domain operation succeeds
//!     → AuditSink::write (try_send, never blocks)
//!     → bounded mpsc queue
//!     → single consumer task (AuditTrail)
//!     → AuditWriter (log, JSON-lines file, memory)
//! ```
//!
//! # Design Decisions
//! - Best-effort delivery: a full queue drops the entry and counts it
//! - Explicit lifecycle: `start()` spawns the consumer, `stop()` drains it
//! - The trail is constructed and injected, never global

pub mod trail;
pub mod writer;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{SystemTime, UNIX_EPOCH};

pub use trail::{AuditSink, AuditTrail};
pub use writer::{AuditWriter, JsonLinesWriter, LogWriter, MemoryWriter};

/// One state-changing operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Who performed the operation.
    pub actor: String,
    /// Subsystem, e.g. `cardholders`.
    pub module: String,
    /// Operation, e.g. `add`.
    pub operation: String,
    /// Operation-specific payload.
    pub details: Value,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        module: impl Into<String>,
        operation: impl Into<String>,
        details: Value,
    ) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            timestamp,
            actor: actor.into(),
            module: module.into(),
            operation: operation.into(),
            details,
        }
    }
}
