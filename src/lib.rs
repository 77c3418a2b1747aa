//! Card access gate: a small HTTP service that manages card holders and
//! system settings behind a uniform request pipeline.

pub mod audit;
pub mod config;
pub mod domain;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::GateConfig;
pub use error::{ClassifiedError, ErrorKind, GateError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
