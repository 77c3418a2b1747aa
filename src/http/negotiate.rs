//! Content negotiation.
//!
//! # Responsibilities
//! - Normalized, case-insensitive header lookup shared by both directions
//! - Gate request bodies on `Content-Type: application/json`
//! - Decide and apply gzip compression for responses
//!
//! # Design Decisions
//! - Content type is checked before the body is parsed
//! - Media type parameters (`; charset=utf-8`) are ignored
//! - Bodies at or below the threshold are never compressed

use std::io::Write;

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use flate2::{write::GzEncoder, Compression};

use crate::error::GateError;

pub const APPLICATION_JSON: &str = "application/json";

/// Look up a header and normalize it: trimmed, lower-cased, multiple values
/// joined with `", "`. `None` when absent or not visible ASCII.
pub fn header_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<String> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Reject requests whose media type is not `application/json`.
pub fn require_json(headers: &HeaderMap) -> Result<(), GateError> {
    let value = header_value(headers, &header::CONTENT_TYPE);
    let media_type = value
        .as_deref()
        .and_then(|v| v.split(';').next())
        .map(str::trim);

    match media_type {
        Some(APPLICATION_JSON) => Ok(()),
        _ => Err(GateError::ContentType(value)),
    }
}

/// True if the client advertised gzip in `Accept-Encoding`.
pub fn accepts_gzip(headers: &HeaderMap) -> bool {
    header_value(headers, &header::ACCEPT_ENCODING).is_some_and(|v| v.contains("gzip"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Identity,
    Gzip,
}

/// A JSON body ready to be written, possibly compressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedResponse {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub encoding: ContentEncoding,
}

/// Response-side negotiator with its compression threshold.
#[derive(Debug, Clone, Copy)]
pub struct Negotiator {
    min_gzip_bytes: usize,
}

impl Negotiator {
    pub fn new(min_gzip_bytes: usize) -> Self {
        Self { min_gzip_bytes }
    }

    /// Encode `json` for a client that sent `request_headers`.
    pub fn encode(
        &self,
        request_headers: &HeaderMap,
        json: Vec<u8>,
    ) -> Result<NegotiatedResponse, GateError> {
        if json.len() <= self.min_gzip_bytes || !accepts_gzip(request_headers) {
            return Ok(NegotiatedResponse {
                bytes: json,
                content_type: APPLICATION_JSON,
                encoding: ContentEncoding::Identity,
            });
        }

        Ok(NegotiatedResponse {
            bytes: gzip(&json).map_err(|e| GateError::internal(format!("gzip: {e}")))?,
            content_type: APPLICATION_JSON,
            encoding: ContentEncoding::Gzip,
        })
    }
}

fn gzip(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

impl IntoResponse for NegotiatedResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.bytes));
        let headers = response.headers_mut();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(self.content_type));
        headers.insert(header::VARY, HeaderValue::from_static("accept-encoding"));
        if self.encoding == ContentEncoding::Gzip {
            headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn headers(pairs: &[(HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_header_value_is_normalized() {
        let map = headers(&[(header::CONTENT_TYPE, "  Application/JSON  ")]);
        assert_eq!(header_value(&map, &header::CONTENT_TYPE).as_deref(), Some("application/json"));
        assert_eq!(header_value(&map, &header::ACCEPT_ENCODING), None);
    }

    #[test]
    fn test_header_value_joins_repeated_headers() {
        let map = headers(&[
            (header::ACCEPT_ENCODING, "deflate"),
            (header::ACCEPT_ENCODING, "GZIP;q=0.5"),
        ]);
        assert_eq!(
            header_value(&map, &header::ACCEPT_ENCODING).as_deref(),
            Some("deflate, gzip;q=0.5")
        );
        assert!(accepts_gzip(&map));
    }

    #[test]
    fn test_accepts_json_variants() {
        for value in [
            "application/json",
            "Application/Json",
            " application/json ",
            "application/json; charset=utf-8",
            "APPLICATION/JSON;charset=UTF-8",
        ] {
            let map = headers(&[(header::CONTENT_TYPE, value)]);
            assert!(require_json(&map).is_ok(), "rejected {value:?}");
        }
    }

    #[test]
    fn test_rejects_other_content_types() {
        for value in ["text/plain", "application/jsonp", "application/x-www-form-urlencoded", ""] {
            let map = headers(&[(header::CONTENT_TYPE, value)]);
            assert!(
                matches!(require_json(&map), Err(GateError::ContentType(_))),
                "accepted {value:?}"
            );
        }
        assert!(matches!(require_json(&HeaderMap::new()), Err(GateError::ContentType(None))));
    }

    #[test]
    fn test_small_bodies_are_not_compressed() {
        let negotiator = Negotiator::new(64);
        let map = headers(&[(header::ACCEPT_ENCODING, "gzip")]);
        let body = br#"{"db":{}}"#.to_vec();

        let encoded = negotiator.encode(&map, body.clone()).unwrap();
        assert_eq!(encoded.encoding, ContentEncoding::Identity);
        assert_eq!(encoded.bytes, body);
    }

    #[test]
    fn test_large_bodies_are_gzipped() {
        let negotiator = Negotiator::new(64);
        let map = headers(&[(header::ACCEPT_ENCODING, "br, gzip")]);
        let body = serde_json::to_vec(&serde_json::json!({ "db": { "padding": "x".repeat(512) } })).unwrap();

        let encoded = negotiator.encode(&map, body.clone()).unwrap();
        assert_eq!(encoded.encoding, ContentEncoding::Gzip);

        let mut decoded = Vec::new();
        GzDecoder::new(&encoded.bytes[..]).read_to_end(&mut decoded).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_no_gzip_without_accept_encoding() {
        let negotiator = Negotiator::new(0);
        let encoded = negotiator.encode(&HeaderMap::new(), b"[1,2,3]".to_vec()).unwrap();
        assert_eq!(encoded.encoding, ContentEncoding::Identity);
    }

    #[test]
    fn test_response_headers() {
        let response = NegotiatedResponse {
            bytes: vec![1, 2, 3],
            content_type: APPLICATION_JSON,
            encoding: ContentEncoding::Gzip,
        }
        .into_response();

        assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
        assert_eq!(response.headers()[header::CONTENT_TYPE], APPLICATION_JSON);
    }
}
