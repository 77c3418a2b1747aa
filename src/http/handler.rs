//! Request handling core shared by every endpoint.
//!
//! # Data Flow
//! ```text
//! write endpoints:
//!     Content-Type gate → read body (413 past the limit) → decode JSON object
//!     → deadline::execute(operation) → Outcome
//! read endpoints:
//!     deadline::execute(operation) → Outcome
//!
//! Outcome::Success  → envelope → serialize → negotiate encoding → 200
//!                     → success hooks (state-changing endpoints only)
//! Outcome::Failure  → classified status + public message
//! Outcome::Expired  → timeout classification
//! ```
//!
//! # Design Decisions
//! - Validation runs before any operation is spawned
//! - The response is built only from the observed `Outcome`
//! - Every failure is logged once, at warn level, with its diagnostic detail
//! - Deadline and compression threshold are read from the live config per request

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::config::SharedConfig;
use crate::domain::fields::Fields;
use crate::error::{classify, ClassifiedError, GateError};
use crate::http::negotiate::{require_json, Negotiator};
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::resilience::deadline::{self, Outcome};

/// Called after a state-changing operation succeeds.
pub trait SuccessHook: Send + Sync {
    fn on_success(&self, endpoint: &'static str);
}

/// Static description of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Name used for logs, metrics and per-endpoint deadlines.
    pub name: &'static str,
    /// Top-level key of the response envelope.
    pub envelope: &'static str,
    /// Whether success triggers the success hooks.
    pub mutates: bool,
}

#[derive(Clone)]
pub struct RequestHandler {
    config: SharedConfig,
    hooks: Vec<Arc<dyn SuccessHook>>,
}

impl RequestHandler {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: impl SuccessHook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Run a read-only operation.
    pub async fn read<T, F, Fut>(&self, endpoint: Endpoint, headers: &HeaderMap, operation: F) -> Response
    where
        F: FnOnce(CancellationToken) -> Fut + Send,
        Fut: Future<Output = Result<T, GateError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let start = Instant::now();
        let deadline = self.config.load().timeouts.deadline_for(endpoint.name);
        let outcome = deadline::execute(deadline, operation).await;
        self.respond(endpoint, headers, outcome, deadline, start)
    }

    /// Validate and decode a JSON body, then run a state-changing operation with it.
    pub async fn write<T, F, Fut>(&self, endpoint: Endpoint, request: Request, operation: F) -> Response
    where
        F: FnOnce(Fields, CancellationToken) -> Fut + Send,
        Fut: Future<Output = Result<T, GateError>> + Send + 'static,
        T: Serialize + Send + 'static,
    {
        let start = Instant::now();
        let deadline = self.config.load().timeouts.deadline_for(endpoint.name);
        let headers = request.headers().clone();

        let fields = match decode_body(request).await {
            Ok(fields) => fields,
            Err(err) => return self.fail(endpoint, &headers, classify(&err), start),
        };

        let outcome = deadline::execute(deadline, move |token| operation(fields, token)).await;
        self.respond(endpoint, &headers, outcome, deadline, start)
    }

    fn respond<T: Serialize>(
        &self,
        endpoint: Endpoint,
        headers: &HeaderMap,
        outcome: Outcome<T>,
        deadline: std::time::Duration,
        start: Instant,
    ) -> Response {
        if outcome.is_expired() {
            metrics::record_timeout(endpoint.name);
        }
        let payload = match outcome.into_result(deadline) {
            Ok(payload) => payload,
            Err(err) => return self.fail(endpoint, headers, err, start),
        };

        if endpoint.mutates {
            for hook in &self.hooks {
                hook.on_success(endpoint.name);
            }
        }

        match self.render(endpoint, headers, &payload) {
            Ok(response) => {
                metrics::record_request(endpoint.name, 200, start);
                response
            }
            Err(err) => self.fail(endpoint, headers, classify(&err), start),
        }
    }

    fn render<T: Serialize>(
        &self,
        endpoint: Endpoint,
        headers: &HeaderMap,
        payload: &T,
    ) -> Result<Response, GateError> {
        let mut envelope = Map::new();
        envelope.insert(
            endpoint.envelope.to_string(),
            serde_json::to_value(payload).map_err(GateError::Serialize)?,
        );
        let json = serde_json::to_vec(&envelope).map_err(GateError::Serialize)?;

        let negotiator = Negotiator::new(self.config.load().compression.min_gzip_bytes);
        Ok(negotiator.encode(headers, json)?.into_response())
    }

    fn fail(&self, endpoint: Endpoint, headers: &HeaderMap, err: ClassifiedError, start: Instant) -> Response {
        let request_id = request_id(headers).unwrap_or_else(|| "-".to_string());
        tracing::warn!(
            endpoint = endpoint.name,
            request_id = %request_id,
            kind = %err.kind,
            status = err.status.as_u16(),
            detail = %err.detail,
            "Request failed"
        );
        metrics::record_request(endpoint.name, err.status.as_u16(), start);
        err.into_response()
    }
}

/// Content-Type gate, then read and decode the body as a JSON object.
///
/// The body is buffered under the router's `DefaultBodyLimit`.
pub async fn decode_body(request: Request) -> Result<Fields, GateError> {
    require_json(request.headers())?;

    let bytes = Bytes::from_request(request, &()).await.map_err(|rejection| {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => GateError::PayloadTooLarge(rejection.body_text()),
            _ => GateError::MalformedBody(format!("unreadable body: {}", rejection.body_text())),
        }
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(GateError::InvalidRequest(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
        Err(e) => Err(GateError::MalformedBody(e.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
