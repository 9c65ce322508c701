//! Upstream request construction and execution.
//!
//! # Responsibilities
//! - Rebuild the inbound request against the resolved upstream
//! - Sanitize headers (routing headers dropped, host rewritten,
//!   content-type defaulted)
//! - Stream the inbound body through for non-GET/HEAD methods
//! - Bound the upstream round trip with a hard deadline
//!
//! # Design Decisions
//! - One shared pooled client for all upstreams; the connector speaks both
//!   http and https so the scheme stays a per-service config choice
//! - The query string is re-appended verbatim, never re-encoded
//! - On deadline expiry the request future is dropped, which tears down the
//!   in-flight upstream connection

use std::net::{IpAddr, Ipv4Addr};
use std::sync::OnceLock;
use std::time::Duration;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{header, HeaderMap, HeaderValue, Method};
use hyper::body::Incoming;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::config::schema::TimeoutConfig;
use crate::proxy::error::ProxyError;
use crate::proxy::routes::Upstream;

/// Shared upstream HTTP client.
pub type ProxyClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Headers meaningful only to the first hop; never forwarded upstream.
const ROUTING_HEADERS: [&str; 4] = [
    "x-forwarded-for",
    "x-forwarded-proto",
    "x-forwarded-host",
    "connection",
];

/// Build the shared upstream client.
pub fn build_client(timeouts: &TimeoutConfig) -> ProxyClient {
    // rustls requires a process-wide crypto provider before any TLS config
    // is built; install exactly once.
    static CRYPTO_PROVIDER: OnceLock<()> = OnceLock::new();
    CRYPTO_PROVIDER.get_or_init(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });

    let mut connector = HttpConnector::new();
    connector.enforce_http(false);
    connector.set_nodelay(true);
    connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
    // The deployment network has inconsistent IPv6 routing; pinning the
    // local address to 0.0.0.0 restricts upstream resolution to IPv4.
    connector.set_local_address(Some(IpAddr::V4(Ipv4Addr::UNSPECIFIED)));

    let https = HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .wrap_connector(connector);

    Client::builder(TokioExecutor::new()).build(https)
}

/// Forward the inbound request to the resolved upstream.
///
/// `rest` is the remaining path after the service segment, without a
/// leading slash. Resolves to the upstream response, or a typed proxy
/// failure; response headers arriving after `timeouts.upstream_secs` count
/// as a gateway timeout.
pub async fn forward(
    client: &ProxyClient,
    upstream: &Upstream,
    rest: &str,
    request: Request,
    timeouts: &TimeoutConfig,
) -> Result<hyper::Response<Incoming>, ProxyError> {
    let (parts, body) = request.into_parts();

    let path_and_query = upstream_path_and_query(rest, parts.uri.query());
    let uri = upstream
        .uri_for(&path_and_query)
        .map_err(|e| ProxyError::Setup(format!("invalid upstream uri: {e}")))?;

    // GET/HEAD carry no body upstream; the framing headers go with it.
    let drop_body = parts.method == Method::GET || parts.method == Method::HEAD;
    let headers = sanitize_headers(&parts.headers, &upstream.authority(), drop_body)?;

    let mut builder = hyper::Request::builder().method(parts.method).uri(uri);
    if let Some(outbound) = builder.headers_mut() {
        *outbound = headers;
    }
    let outbound = builder
        .body(if drop_body { Body::empty() } else { body })
        .map_err(|e| ProxyError::Setup(format!("failed to build upstream request: {e}")))?;

    let deadline = Duration::from_secs(timeouts.upstream_secs);
    match tokio::time::timeout(deadline, client.request(outbound)).await {
        Ok(Ok(response)) => Ok(response),
        Ok(Err(err)) => Err(ProxyError::UpstreamUnreachable(error_chain(&err))),
        Err(_) => Err(ProxyError::GatewayTimeout(timeouts.upstream_secs)),
    }
}

/// Join the remaining path segments and re-append the query verbatim.
pub(crate) fn upstream_path_and_query(rest: &str, query: Option<&str>) -> String {
    let mut target = String::with_capacity(1 + rest.len());
    target.push('/');
    target.push_str(rest);
    if let Some(query) = query {
        target.push('?');
        target.push_str(query);
    }
    target
}

/// Copy inbound headers minus the routing deny-list, rewrite `host` to the
/// upstream authority, and default `content-type` to JSON when the inbound
/// request did not declare one.
pub(crate) fn sanitize_headers(
    inbound: &HeaderMap,
    authority: &str,
    drop_body_framing: bool,
) -> Result<HeaderMap, ProxyError> {
    let mut outbound = HeaderMap::with_capacity(inbound.len());
    for (name, value) in inbound {
        if ROUTING_HEADERS.contains(&name.as_str()) || name == &header::HOST {
            continue;
        }
        if drop_body_framing
            && (name == &header::CONTENT_LENGTH || name == &header::TRANSFER_ENCODING)
        {
            continue;
        }
        outbound.append(name.clone(), value.clone());
    }

    let host = HeaderValue::from_str(authority)
        .map_err(|e| ProxyError::Setup(format!("invalid upstream authority {authority:?}: {e}")))?;
    outbound.insert(header::HOST, host);

    // Inbound content-type, when present, takes precedence.
    if !outbound.contains_key(header::CONTENT_TYPE) {
        outbound.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
    }

    Ok(outbound)
}

/// Flatten an error and its sources into one line of detail.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("dashboard.local"));
        headers.insert("accept", HeaderValue::from_static("application/json"));
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1"));
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("dashboard.local"));
        headers.insert("connection", HeaderValue::from_static("keep-alive"));
        headers
    }

    #[test]
    fn routing_headers_are_never_forwarded() {
        let sanitized = sanitize_headers(&inbound_headers(), "api-service:8083", false).unwrap();
        for name in ROUTING_HEADERS {
            assert!(!sanitized.contains_key(name), "{name} must be dropped");
        }
        assert_eq!(sanitized.get("accept").unwrap(), "application/json");
    }

    #[test]
    fn host_is_rewritten_to_the_upstream_authority() {
        let sanitized = sanitize_headers(&inbound_headers(), "api-service:8083", false).unwrap();
        assert_eq!(sanitized.get("host").unwrap(), "api-service:8083");
    }

    #[test]
    fn content_type_defaults_to_json() {
        let sanitized = sanitize_headers(&inbound_headers(), "api-service:8083", false).unwrap();
        assert_eq!(sanitized.get("content-type").unwrap(), "application/json");
    }

    #[test]
    fn inbound_content_type_takes_precedence() {
        let mut headers = inbound_headers();
        headers.insert("content-type", HeaderValue::from_static("text/csv"));
        let sanitized = sanitize_headers(&headers, "api-service:8083", false).unwrap();
        assert_eq!(sanitized.get("content-type").unwrap(), "text/csv");
    }

    #[test]
    fn body_framing_is_dropped_with_the_body() {
        let mut headers = inbound_headers();
        headers.insert("content-length", HeaderValue::from_static("42"));
        let sanitized = sanitize_headers(&headers, "api-service:8083", true).unwrap();
        assert!(!sanitized.contains_key("content-length"));

        let kept = sanitize_headers(&headers, "api-service:8083", false).unwrap();
        assert_eq!(kept.get("content-length").unwrap(), "42");
    }

    #[test]
    fn path_join_handles_empty_rest() {
        assert_eq!(upstream_path_and_query("", None), "/");
        assert_eq!(upstream_path_and_query("sensors/latest", None), "/sensors/latest");
    }

    #[test]
    fn query_is_appended_verbatim() {
        assert_eq!(
            upstream_path_and_query("sensors/latest", Some("sensorId=5")),
            "/sensors/latest?sensorId=5"
        );
        // Pre-encoded input must not be re-encoded.
        assert_eq!(
            upstream_path_and_query("search", Some("q=a%20b&path=%2Ftmp")),
            "/search?q=a%20b&path=%2Ftmp"
        );
    }
}
