//! Service route table.
//!
//! # Responsibilities
//! - Compile the configured service list into an immutable lookup table
//! - Resolve the first path segment after `/proxy/` to an upstream
//! - Return explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Exact name lookup only; names are validated lowercase tokens
//! - Table is built once at startup and shared via Arc, so no locking

use std::collections::HashMap;

use axum::http::Uri;

use crate::config::schema::{ServiceConfig, UpstreamScheme};
use crate::proxy::error::ProxyError;

/// Proxy mount point for inbound requests.
pub const PROXY_PREFIX: &str = "/proxy";

/// A resolved upstream network location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    pub scheme: UpstreamScheme,
    pub host: String,
    pub port: u16,
}

impl Upstream {
    /// The `host:port` authority, used both for dialing and the forwarded
    /// `host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the full upstream URI for an already-joined path-and-query.
    pub fn uri_for(&self, path_and_query: &str) -> Result<Uri, axum::http::uri::InvalidUri> {
        format!("{}://{}{}", self.scheme, self.authority(), path_and_query).parse()
    }
}

/// Immutable mapping of service names to upstreams.
///
/// Compiled from configuration at startup; never mutated afterwards.
#[derive(Debug, Default)]
pub struct RouteTable {
    services: HashMap<String, Upstream>,
}

impl RouteTable {
    /// Compile the table from the configured service list.
    pub fn from_services(services: &[ServiceConfig]) -> Self {
        let services = services
            .iter()
            .map(|s| {
                (
                    s.name.clone(),
                    Upstream {
                        scheme: s.scheme,
                        host: s.host.clone(),
                        port: s.port,
                    },
                )
            })
            .collect();
        Self { services }
    }

    /// Resolve a service name to its upstream, if configured.
    pub fn resolve(&self, service: &str) -> Option<&Upstream> {
        self.services.get(service)
    }

    /// Names of all configured services, for startup logging.
    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Split an inbound request path into the service segment and the remaining
/// path (without its leading slash).
///
/// `/proxy/api/sensors/latest` becomes `("api", "sensors/latest")`. A
/// missing or empty service segment is a malformed request; the caller must
/// answer 400 without touching the network.
pub fn split_proxy_path(path: &str) -> Result<(&str, &str), ProxyError> {
    let remainder = path
        .strip_prefix(PROXY_PREFIX)
        .ok_or(ProxyError::InvalidPath)?;
    let remainder = match remainder.strip_prefix('/') {
        Some(r) => r,
        None if remainder.is_empty() => "",
        None => return Err(ProxyError::InvalidPath),
    };
    let (service, rest) = match remainder.split_once('/') {
        Some((service, rest)) => (service, rest),
        None => (remainder, ""),
    };
    if service.is_empty() {
        return Err(ProxyError::InvalidPath);
    }
    Ok((service, rest))
}
