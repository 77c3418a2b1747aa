//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (cap request body size before it is buffered)
//!     → handler runs domain operation
//!         → auth.rs (Authorizator consulted by the domain layer)
//!         → policy.rs (concrete capability rules)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a denial aborts the operation before any mutation
//! - Denial reasons are diagnostic only, never sent to the client
//! - Policies are injected, not global

pub mod auth;
pub mod limits;
pub mod policy;

pub use auth::{AuthError, Authorizator, Entity};
pub use policy::{AllowAll, CardPolicy};
