//! Domain collaborators behind the request-handling core.
//!
//! # Data Flow
//! ```text
//! Handler (deadline, cancellation token)
//!     → cardholders.rs / system.rs (validate fields, authorize, commit)
//!         → security::Authorizator (capability checks)
//!         → audit::AuditSink (fire-and-forget entry)
//!     → refresh.rs (success hook: recompute group membership)
//!         → rules.rs (RuleEvaluator)
//! ```
//!
//! # Design Decisions
//! - In-memory state owned by explicitly constructed services shared via `Arc`
//! - Operations check their cancellation token after their last suspension
//!   point, right before the write. On a multi-threaded runtime the deadline
//!   can still fire between that check and the write.
//! - Field decoding errors are `InvalidRequest`, policy refusals are `Denied`

pub mod cardholders;
pub mod fields;
pub mod refresh;
pub mod rules;
pub mod system;

pub use cardholders::{CardHolder, CardHolders};
pub use refresh::AclRefresh;
pub use rules::{GroupRules, RuleError, RuleEvaluator};
pub use system::{System, SystemInfo};
