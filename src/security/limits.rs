//! Request size limits.
//!
//! # Responsibilities
//! - Enforce maximum request body size before the body is buffered
//!
//! # Design Decisions
//! - Limits checked before JSON parsing (early rejection)
//! - A declared `Content-Length` over the limit is answered with 413 by tower-http
//! - A chunked body that runs over the limit fails while buffering; the
//!   handler classifies that as 413 as well

use axum::extract::DefaultBodyLimit;
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::SecurityConfig;

/// Build the body limit layer for the configured maximum.
pub fn body_limit_layer(config: &SecurityConfig) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(config.max_body_size)
}

/// Limit applied by axum's body extractors, kept equal to the tower-http limit.
pub fn extractor_limit(config: &SecurityConfig) -> DefaultBodyLimit {
    DefaultBodyLimit::max(config.max_body_size)
}
