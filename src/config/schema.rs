//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the telemetry gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream service definitions.
    pub services: Vec<ServiceConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            services: default_services(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// One upstream service reachable through the gateway.
///
/// The first path segment after `/proxy/` selects a service by `name`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service name, as it appears in request paths. Lowercase token.
    pub name: String,

    /// Upstream hostname (e.g., "api-service").
    pub host: String,

    /// Upstream port.
    pub port: u16,

    /// Transport scheme for this upstream.
    #[serde(default)]
    pub scheme: UpstreamScheme,
}

/// Transport scheme used to reach an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamScheme {
    #[default]
    Http,
    Https,
}

impl std::fmt::Display for UpstreamScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamScheme::Http => write!(f, "http"),
            UpstreamScheme::Https => write!(f, "https"),
        }
    }
}

/// The fixed service table of the telemetry deployment.
///
/// Used when no services are configured explicitly.
pub fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig {
            name: "api".to_string(),
            host: "api-service".to_string(),
            port: 8083,
            scheme: UpstreamScheme::Http,
        },
        ServiceConfig {
            name: "producer".to_string(),
            host: "producer-service".to_string(),
            port: 8081,
            scheme: UpstreamScheme::Http,
        },
        ServiceConfig {
            name: "consumer".to_string(),
            host: "consumer-service".to_string(),
            port: 8082,
            scheme: UpstreamScheme::Http,
        },
    ]
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Upstream round-trip deadline (connect + response headers) in seconds.
    pub upstream_secs: u64,

    /// Whole-request timeout at the boundary in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 10,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gets_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
        assert_eq!(config.timeouts.upstream_secs, 10);
        assert_eq!(config.services.len(), 3);
    }

    #[test]
    fn service_scheme_defaults_to_http() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[services]]
            name = "api"
            host = "api-service"
            port = 8083
            "#,
        )
        .unwrap();
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].scheme, UpstreamScheme::Http);
    }

    #[test]
    fn https_scheme_parses() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[services]]
            name = "api"
            host = "api-service"
            port = 443
            scheme = "https"
            "#,
        )
        .unwrap();
        assert_eq!(config.services[0].scheme, UpstreamScheme::Https);
    }

    #[test]
    fn default_table_covers_the_three_services() {
        let services = default_services();
        let names: Vec<&str> = services.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["api", "producer", "consumer"]);
    }
}
