//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware layers)
//!     → request.rs (request ID, acting user)
//!     → routes.rs (endpoint table)
//!     → handler.rs (content-type gate, decode, deadline, envelope)
//!     → negotiate.rs (gzip or identity)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Every endpoint goes through the same `RequestHandler`
//! - Clients only ever see fixed public messages; details go to the log
//! - Request ID generated early for tracing

pub mod handler;
pub mod negotiate;
pub mod request;
pub mod routes;
pub mod server;

pub use handler::{Endpoint, RequestHandler, SuccessHook};
pub use negotiate::{ContentEncoding, NegotiatedResponse, Negotiator};
pub use server::{HttpServer, Services};
