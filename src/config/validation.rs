//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses, method names and value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::methods::STANDARD_METHODS;

/// One semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("router.custom_methods: invalid method name '{0}'")]
    InvalidMethod(String),

    #[error("router.custom_methods: '{0}' is listed more than once")]
    DuplicateMethod(String),

    #[error("router.custom_methods: {0} methods exceed the registry capacity")]
    TooManyMethods(usize),

    #[error("router.context_pool: prewarm ({prewarm}) exceeds max_idle ({max_idle})")]
    PrewarmExceedsIdle { prewarm: usize, max_idle: usize },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,
}

/// Registry capacity left after the standard methods.
const CUSTOM_METHOD_CAPACITY: usize = 63 - STANDARD_METHODS.len();

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let mut seen = HashSet::new();
    for name in &config.router.custom_methods {
        if axum::http::Method::from_bytes(name.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(name.clone()));
        } else if !seen.insert(name.to_ascii_uppercase()) {
            errors.push(ValidationError::DuplicateMethod(name.clone()));
        }
    }
    let custom = config
        .router
        .custom_methods
        .iter()
        .filter(|name| !STANDARD_METHODS.contains(&name.to_ascii_uppercase().as_str()))
        .count();
    if custom > CUSTOM_METHOD_CAPACITY {
        errors.push(ValidationError::TooManyMethods(custom));
    }

    let pool = &config.router.context_pool;
    if pool.prewarm > pool.max_idle {
        errors.push(ValidationError::PrewarmExceedsIdle {
            prewarm: pool.prewarm,
            max_idle: pool.max_idle,
        });
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
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

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.router.custom_methods = vec!["LINK".into(), "link".into(), "BAD METHOD".into()];
        config.router.context_pool.max_idle = 4;
        config.router.context_pool.prewarm = 8;
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidAddress {
                    field: "listener.bind_address",
                    value: "nowhere".into(),
                },
                ValidationError::DuplicateMethod("link".into()),
                ValidationError::InvalidMethod("BAD METHOD".into()),
                ValidationError::PrewarmExceedsIdle {
                    prewarm: 8,
                    max_idle: 4,
                },
                ValidationError::ZeroTimeout,
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = AppConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());
        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
