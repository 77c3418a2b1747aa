//! Request identity.
//!
//! # Responsibilities
//! - Generate and propagate `x-request-id` (UUID v4)
//! - Open the per-request trace span carrying that ID
//! - Identify the acting user for audit entries
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Header reads go through the shared normalized lookup

use axum::http::{HeaderMap, HeaderName, Request};
use tracing::Span;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::http::negotiate::header_value;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");
pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");

/// Actor recorded when a request carries no `x-user-id`.
pub const ANONYMOUS: &str = "anonymous";

/// Layer that assigns a UUID to requests arriving without an `x-request-id`.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer that copies the request's `x-request-id` onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// The request's `x-request-id`, if any.
pub fn request_id(headers: &HeaderMap) -> Option<String> {
    header_value(headers, &X_REQUEST_ID)
}

/// Span for `TraceLayer`. Runs inside `set_request_id_layer`, so the ID is present.
pub fn request_span<B>(request: &Request<B>) -> Span {
    let request_id = request_id(request.headers()).unwrap_or_default();
    tracing::info_span!(
        "request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = %request_id,
    )
}

/// The acting user, lower-cased; `anonymous` when absent.
pub fn actor(headers: &HeaderMap) -> String {
    header_value(headers, &X_USER_ID).unwrap_or_else(|| ANONYMOUS.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_request_span_records_request_id() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        let request = Request::builder()
            .uri("/cardholders")
            .header(X_REQUEST_ID, "req-7")
            .body(())
            .unwrap();

        tracing::subscriber::with_default(subscriber, || {
            let span = request_span(&request);
            let _entered = span.enter();
            tracing::info!("handled");
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("request_id=req-7"), "{output}");
        assert!(output.contains("uri=/cardholders"), "{output}");
    }

    #[test]
    fn test_actor_defaults_to_anonymous() {
        let mut headers = HeaderMap::new();
        assert_eq!(actor(&headers), ANONYMOUS);

        headers.insert(X_USER_ID, HeaderValue::from_static(" Alice "));
        assert_eq!(actor(&headers), "alice");
    }
}
