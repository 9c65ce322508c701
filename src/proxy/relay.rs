//! Upstream response relay.
//!
//! # Responsibilities
//! - Buffer the full upstream body before the outbound response starts, so
//!   status, headers, and body always form one well-formed message
//! - Normalize JSON bodies; pass everything else through byte-for-byte
//!
//! # Design Decisions
//! - Upstream services are inconsistent about declaring JSON content-type,
//!   so the relay sniffs the body rather than trusting the header
//! - `content-length`, `transfer-encoding`, and `connection` are not
//!   copied: the body may be re-serialized and framing belongs to this hop

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use serde_json::Value;

use crate::proxy::error::ProxyError;

/// Transcribe the upstream response for the original caller.
pub async fn relay(upstream: hyper::Response<Incoming>) -> Result<Response, ProxyError> {
    let (parts, body) = upstream.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| ProxyError::UpstreamUnreachable(format!("error reading upstream body: {e}")))?
        .to_bytes();

    let mut headers = HeaderMap::with_capacity(parts.headers.len());
    for (name, value) in &parts.headers {
        if name == &header::CONTENT_LENGTH
            || name == &header::TRANSFER_ENCODING
            || name == &header::CONNECTION
        {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }

    let body = match normalized_json(&bytes) {
        Some(normalized) => {
            headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            Body::from(normalized)
        }
        None => Body::from(bytes),
    };

    let mut builder = Response::builder().status(parts.status);
    if let Some(outbound) = builder.headers_mut() {
        *outbound = headers;
    }
    builder
        .body(body)
        .map_err(|e| ProxyError::Setup(format!("failed to assemble response: {e}")))
}

/// Re-serialize the body if it parses as JSON; `None` means pass the raw
/// bytes through unchanged.
pub(crate) fn normalized_json(bytes: &[u8]) -> Option<Vec<u8>> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    serde_json::to_vec(&value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_is_normalized() {
        let raw = br#"{ "b": 2,
            "a": 1 }"#;
        let normalized = normalized_json(raw).unwrap();
        let reparsed: Value = serde_json::from_slice(&normalized).unwrap();
        assert_eq!(reparsed, serde_json::json!({"a": 1, "b": 2}));
    }

    #[test]
    fn normalization_is_stable() {
        let raw = br#"[1, 2, {"nested": true}]"#;
        let once = normalized_json(raw).unwrap();
        let twice = normalized_json(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn scalars_count_as_json() {
        assert_eq!(normalized_json(b"5").unwrap(), b"5");
        assert_eq!(normalized_json(b"null").unwrap(), b"null");
    }

    #[test]
    fn text_and_binary_pass_through() {
        assert!(normalized_json(b"hello, sensor world").is_none());
        assert!(normalized_json(b"").is_none());
        assert!(normalized_json(&[0xff, 0xfe, 0x00]).is_none());
    }

    #[test]
    fn truncated_json_passes_through() {
        assert!(normalized_json(br#"{"a": 1"#).is_none());
    }
}
