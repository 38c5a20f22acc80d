//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check route entries (template present, backends parse as URLs)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure functions: config in, `Result<(), Vec<ValidationError>>` out
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use crate::config::routes::RouteEntry;
use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub problem: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

fn error(field: &str, problem: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        problem: problem.into(),
    }
}

/// Validate the main gateway configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(error(
            "listener.bind_address",
            format!("not a socket address: {}", config.listener.bind_address),
        ));
    }
    if config.listener.max_body_bytes == 0 {
        errors.push(error("listener.max_body_bytes", "must be greater than zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(error("timeouts.request_secs", "must be greater than zero"));
    }
    if config.timeouts.backend_secs == 0 {
        errors.push(error("timeouts.backend_secs", "must be greater than zero"));
    }
    if config.auth.token_secret.is_empty() {
        errors.push(error("auth.token_secret", "must not be empty"));
    }
    if config.auth.registration_key.is_empty() {
        errors.push(error("auth.registration_key", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate the loaded route entries.
pub fn validate_routes(entries: &[RouteEntry]) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut seen_paths = std::collections::HashSet::new();

    for (index, entry) in entries.iter().enumerate() {
        let field = format!("routes[{index}].routeInfo");
        match &entry.route_info.path {
            None => errors.push(error(&field, "missing path template")),
            Some(path) if !path.starts_with('/') => {
                errors.push(error(&field, format!("path must start with '/': {path}")))
            }
            Some(path) => {
                // one route per configured path
                if !seen_paths.insert(path.as_str()) {
                    errors.push(error(&field, format!("duplicate path template: {path}")));
                }
            }
        }
        for backend in &entry.route_info.backends {
            if url::Url::parse(backend).is_err() {
                errors.push(error(&field, format!("invalid backend URL: {backend}")));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::routes::RouteInfoConfig;

    #[test]
    fn test_default_config_flags_placeholder_free_fields_only() {
        // defaults carry placeholder secrets but are structurally valid
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "nonsense".to_string();
        config.timeouts.backend_secs = 0;
        config.auth.token_secret = String::new();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_route_validation() {
        let entries = vec![
            RouteEntry {
                route_info: RouteInfoConfig {
                    path: Some("/ok".to_string()),
                    backends: vec!["http://localhost:3000".to_string()],
                    remove_prefix: false,
                },
                ..Default::default()
            },
            RouteEntry {
                route_info: RouteInfoConfig {
                    path: None,
                    backends: vec!["not a url".to_string()],
                    remove_prefix: false,
                },
                ..Default::default()
            },
        ];
        let errors = validate_routes(&entries).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
