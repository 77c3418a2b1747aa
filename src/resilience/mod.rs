//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Handler submits domain operation:
//!     → deadline.rs (spawn worker, race it against the deadline)
//!     → Outcome::Success | Outcome::Failure | Outcome::Expired
//!     → Handler maps the outcome to a response
//! ```
//!
//! # Design Decisions
//! - Every domain operation has a deadline; none wait unbounded
//! - No automatic retries; retrying belongs to whoever issued the request
//! - Expiry cancels the operation cooperatively, never by force

pub mod deadline;

pub use deadline::{execute, Outcome};
