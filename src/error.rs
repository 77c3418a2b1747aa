//! Error taxonomy and classification.
//!
//! # Responsibilities
//! - Define the errors produced while handling a request (`GateError`)
//! - Map every error onto a transport-visible `ClassifiedError`
//! - Keep diagnostic detail out of the response body
//!
//! # Design Decisions
//! - Classification happens once, at the executor/handler boundary
//! - Public messages are fixed strings per error class
//! - Unclassified errors become `Internal` with a generic message

use std::fmt;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::security::AuthError;

pub const MSG_CONTENT_TYPE: &str = "invalid request content-type";
pub const MSG_MALFORMED_BODY: &str = "invalid request body";
pub const MSG_PAYLOAD_TOO_LARGE: &str = "request body too large";
pub const MSG_INVALID_REQUEST: &str = "invalid request";
pub const MSG_UNAUTHORIZED: &str = "not authorized";
pub const MSG_FORBIDDEN: &str = "not allowed";
pub const MSG_NOT_FOUND: &str = "not found";
pub const MSG_RESPONSE: &str = "internal error generating response";
pub const MSG_INTERNAL: &str = "internal system error";
pub const MSG_TIMEOUT: &str = "timeout waiting for response from system";

/// Errors raised anywhere along the request path.
#[derive(Debug, Error)]
pub enum GateError {
    /// Request carried no, or the wrong, `Content-Type`.
    #[error("invalid content type: {}", .0.as_deref().unwrap_or("<missing>"))]
    ContentType(Option<String>),

    /// Request body could not be decoded as JSON.
    #[error("malformed JSON body: {0}")]
    MalformedBody(String),

    /// Request body exceeded the configured size limit.
    #[error("request body too large: {0}")]
    PayloadTooLarge(String),

    /// Request was well-formed but semantically invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// No acting user could be established.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Authorization policy denied the operation.
    #[error(transparent)]
    Denied(#[from] AuthError),

    /// Entity referenced by the request does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Response payload could not be serialized.
    #[error("error generating response: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Operation observed its cancellation token and gave up.
    #[error("operation cancelled")]
    Cancelled,

    /// Deadline elapsed before the operation completed.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// Anything else.
    #[error("{0}")]
    Internal(String),
}

impl GateError {
    /// Wrap an arbitrary error as an unclassified internal failure.
    pub fn internal(err: impl fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Transport-visible error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,
    PayloadTooLarge,
    Unauthorized,
    Forbidden,
    NotFound,
    Internal,
    Timeout,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal | ErrorKind::Timeout => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
            ErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized error: what the client sees plus what only the logs see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub status: StatusCode,
    pub public_message: &'static str,
    pub detail: String,
}

impl ClassifiedError {
    fn new(kind: ErrorKind, public_message: &'static str, detail: String) -> Self {
        Self {
            kind,
            status: kind.status(),
            public_message,
            detail,
        }
    }

    /// The classification used when a deadline elapses.
    pub fn timeout(deadline: Duration) -> Self {
        classify(&GateError::Timeout(deadline))
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.status, self.detail)
    }
}

impl From<GateError> for ClassifiedError {
    fn from(err: GateError) -> Self {
        classify(&err)
    }
}

/// Map an error onto its transport-visible classification.
pub fn classify(err: &GateError) -> ClassifiedError {
    let detail = err.to_string();
    match err {
        GateError::ContentType(_) => ClassifiedError::new(ErrorKind::BadRequest, MSG_CONTENT_TYPE, detail),
        GateError::MalformedBody(_) => ClassifiedError::new(ErrorKind::BadRequest, MSG_MALFORMED_BODY, detail),
        GateError::PayloadTooLarge(_) => {
            ClassifiedError::new(ErrorKind::PayloadTooLarge, MSG_PAYLOAD_TOO_LARGE, detail)
        }
        GateError::InvalidRequest(_) => ClassifiedError::new(ErrorKind::BadRequest, MSG_INVALID_REQUEST, detail),
        GateError::Unauthenticated(_) => ClassifiedError::new(ErrorKind::Unauthorized, MSG_UNAUTHORIZED, detail),
        GateError::Denied(_) => ClassifiedError::new(ErrorKind::Forbidden, MSG_FORBIDDEN, detail),
        GateError::NotFound(_) => ClassifiedError::new(ErrorKind::NotFound, MSG_NOT_FOUND, detail),
        GateError::Serialize(_) => ClassifiedError::new(ErrorKind::Internal, MSG_RESPONSE, detail),
        GateError::Cancelled | GateError::Timeout(_) => {
            ClassifiedError::new(ErrorKind::Timeout, MSG_TIMEOUT, detail)
        }
        GateError::Internal(_) => ClassifiedError::new(ErrorKind::Internal, MSG_INTERNAL, detail),
    }
}

impl IntoResponse for ClassifiedError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        response
    }
}
