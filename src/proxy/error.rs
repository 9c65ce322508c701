//! Gateway failure taxonomy.
//!
//! Every variant is terminal for the request that raised it and maps to a
//! fixed status code with a structured JSON body. The `message` field, where
//! present, carries the underlying technical detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors that can occur while proxying a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// No service segment after the proxy prefix.
    #[error("no service segment in request path")]
    InvalidPath,

    /// The first path segment names no configured service.
    #[error("unknown service {0:?}")]
    UnknownService(String),

    /// Network-level failure reaching the upstream (refused, DNS, reset).
    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// Upstream did not produce response headers within the deadline.
    #[error("upstream did not respond within {0} seconds")]
    GatewayTimeout(u64),

    /// Failure assembling the outbound request.
    #[error("proxy setup failed: {0}")]
    Setup(String),
}

impl ProxyError {
    /// HTTP status code surfaced to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::InvalidPath => StatusCode::BAD_REQUEST,
            ProxyError::UnknownService(_) => StatusCode::NOT_FOUND,
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Setup(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = match &self {
            ProxyError::InvalidPath => json!({ "error": "Invalid path" }),
            ProxyError::UnknownService(_) => json!({ "error": "Unknown service" }),
            ProxyError::UpstreamUnreachable(detail) => {
                json!({ "error": "Proxy error", "message": detail })
            }
            ProxyError::GatewayTimeout(_) => json!({ "error": "Gateway timeout" }),
            ProxyError::Setup(detail) => {
                json!({ "error": "Proxy setup failed", "message": detail })
            }
        };
        (self.status(), Json(body)).into_response()
    }
}
