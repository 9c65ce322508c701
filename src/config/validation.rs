//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Returns all validation errors, not just the first, so a broken config
//! can be fixed in one pass.

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Service names route requests, so they must be usable path segments.
    #[error("service name {0:?} is not a non-empty lowercase token")]
    InvalidServiceName(String),

    #[error("duplicate service name {0:?}")]
    DuplicateService(String),

    #[error("service {0:?} has an empty host")]
    EmptyHost(String),

    #[error("service {0:?} has port 0")]
    ZeroPort(String),

    #[error("timeout {0} must be non-zero")]
    ZeroTimeout(&'static str),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for service in &config.services {
        if !is_service_token(&service.name) {
            errors.push(ValidationError::InvalidServiceName(service.name.clone()));
        }
        if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if service.host.is_empty() {
            errors.push(ValidationError::EmptyHost(service.name.clone()));
        }
        if service.port == 0 {
            errors.push(ValidationError::ZeroPort(service.name.clone()));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// A service name is a non-empty lowercase token: `[a-z0-9-]+`.
fn is_service_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{ServiceConfig, UpstreamScheme};

    fn service(name: &str) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            host: "upstream".to_string(),
            port: 8080,
            scheme: UpstreamScheme::Http,
        }
    }

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn rejects_uppercase_and_empty_names() {
        let mut config = GatewayConfig::default();
        config.services = vec![service("API"), service("")];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidServiceName("API".to_string()),
                ValidationError::InvalidServiceName("".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_duplicate_services() {
        let mut config = GatewayConfig::default();
        config.services = vec![service("api"), service("api")];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateService("api".to_string())));
    }

    #[test]
    fn collects_every_error() {
        let mut config = GatewayConfig::default();
        let mut bad = service("api");
        bad.host = String::new();
        bad.port = 0;
        config.services = vec![bad];
        config.timeouts.upstream_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn accepts_hyphenated_names() {
        let mut config = GatewayConfig::default();
        config.services = vec![service("sensor-api"), service("v2")];
        assert!(validate_config(&config).is_ok());
    }
}
