//! Configuration validation.
//!
//! # Responsibilities
//! - Validate value ranges (port, timeouts > 0)
//! - Check backend URLs carry a scheme and a host
//! - Check the health check timeout fits inside its interval
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), ValidationError>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::BalancerConfig;
use crate::errors::LoadBalancerError;

/// Every rule a configuration violated.
#[derive(Debug, Error)]
#[error("{}", summarize(.errors))]
pub struct ValidationError {
    errors: Vec<LoadBalancerError>,
}

fn summarize(errors: &[LoadBalancerError]) -> String {
    match errors {
        [] => "no validation errors".to_string(),
        [only] => format!("validation failed: {}", only),
        [first, rest @ ..] => format!(
            "validation failed with {} errors: {} (and {} more)",
            errors.len(),
            first,
            rest.len()
        ),
    }
}

impl ValidationError {
    pub fn errors(&self) -> &[LoadBalancerError] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a configuration, collecting every violated rule.
pub fn validate_config(config: &BalancerConfig) -> Result<(), ValidationError> {
    let mut errors = Vec::new();

    let port = config.listener.port;
    if port == 0 || port > u32::from(u16::MAX) {
        errors.push(LoadBalancerError::invalid_port(port));
    }

    if config.backends.is_empty() {
        errors.push(LoadBalancerError::invalid_config("at least one backend is required"));
    }

    for (index, backend) in config.backends.iter().enumerate() {
        if let Err(e) = check_backend_url(backend) {
            errors.push(e.with_context("index", index));
        }
    }

    let health = &config.health_check;
    if health.path.is_empty() {
        errors.push(LoadBalancerError::invalid_health_check(
            "health check path cannot be empty",
        ));
    }

    if health.interval_secs == 0 {
        errors.push(LoadBalancerError::invalid_timeout("health check interval", health.interval_secs));
    }

    if health.timeout_secs == 0 {
        errors.push(LoadBalancerError::invalid_timeout("health check", health.timeout_secs));
    }

    if health.timeout_secs >= health.interval_secs {
        errors.push(
            LoadBalancerError::invalid_config(format!(
                "health check timeout ({}s) must be less than interval ({}s)",
                health.timeout_secs, health.interval_secs
            ))
            .with_context("timeout_secs", health.timeout_secs)
            .with_context("interval_secs", health.interval_secs),
        );
    }

    if config.timeouts.backend_secs == 0 {
        errors.push(LoadBalancerError::invalid_timeout("backend", config.timeouts.backend_secs));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

fn check_backend_url(backend: &str) -> Result<(), LoadBalancerError> {
    if backend.trim().is_empty() {
        return Err(LoadBalancerError::invalid_backend(backend, "backend cannot be empty"));
    }

    let url = Url::parse(backend).map_err(|e| LoadBalancerError::invalid_backend(backend, e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(LoadBalancerError::invalid_backend(
            backend,
            "must include a scheme (http:// or https://)",
        ));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(LoadBalancerError::invalid_backend(backend, "must include a host"));
    }

    Ok(())
}

impl BalancerConfig {
    /// Validate this configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;

    fn valid_config() -> BalancerConfig {
        let mut config = BalancerConfig::default();
        config.backends = vec![
            "http://localhost:8080".into(),
            "https://backend.example.com:443".into(),
        ];
        config.health_check.path = "/health".into();
        config
    }

    fn codes(err: &ValidationError) -> Vec<ErrorCode> {
        err.errors().iter().map(|e| e.code()).collect()
    }

    #[test]
    fn test_valid_configuration() {
        assert!(valid_config().validate().is_ok());
        assert!(BalancerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_ports() {
        for port in [0, 65536, 99999] {
            let mut config = valid_config();
            config.listener.port = port;
            let err = config.validate().unwrap_err();
            assert!(codes(&err).contains(&ErrorCode::InvalidPort), "port {port}");
        }

        let mut config = valid_config();
        config.listener.port = 65535;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_backends() {
        let cases: &[(&[&str], usize)] = &[
            (&[], 1),
            (&[""], 1),
            (&["not-a-url"], 1),
            (&["localhost:8080"], 1),
            (&["http://"], 1),
            (&["ftp://files.example.com"], 1),
            (&["invalid1", "invalid2"], 2),
        ];

        for (backends, expected) in cases {
            let mut config = valid_config();
            config.backends = backends.iter().map(|s| s.to_string()).collect();
            let err = config.validate().unwrap_err();
            assert!(
                err.len() >= *expected,
                "{:?}: expected at least {} errors, got {}",
                backends,
                expected,
                err.len()
            );
            assert!(err.errors().iter().all(|e| e.is_configuration()));
        }
    }

    #[test]
    fn test_backend_errors_carry_index() {
        let mut config = valid_config();
        config.backends = vec!["http://ok:1".into(), "nope".into()];
        let err = config.validate().unwrap_err();
        assert_eq!(err.len(), 1);
        assert_eq!(err.errors()[0].code(), ErrorCode::InvalidBackend);
        assert_eq!(err.errors()[0].context("index"), Some("1"));
        assert_eq!(err.errors()[0].context("backend"), Some("nope"));
    }

    #[test]
    fn test_timeout_validation() {
        let cases = [
            (10, 2, 30, true),
            (10, 10, 30, false),
            (10, 15, 30, false),
            (0, 2, 30, false),
            (10, 0, 30, false),
            (10, 2, 0, false),
        ];

        for (interval, timeout, backend, expect_valid) in cases {
            let mut config = valid_config();
            config.health_check.interval_secs = interval;
            config.health_check.timeout_secs = timeout;
            config.timeouts.backend_secs = backend;
            assert_eq!(
                config.validate().is_ok(),
                expect_valid,
                "interval={interval} timeout={timeout} backend={backend}"
            );
        }
    }

    #[test]
    fn test_empty_health_check_path() {
        let mut config = valid_config();
        config.health_check.path = String::new();
        let err = config.validate().unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::InvalidHealthCheck]);
    }

    #[test]
    fn test_validation_error_aggregation() {
        let mut config = valid_config();
        config.listener.port = 99999;
        config.backends = vec!["invalid-url".into(), String::new()];
        config.health_check.path = String::new();
        config.health_check.interval_secs = 1;
        config.health_check.timeout_secs = 2;
        config.timeouts.backend_secs = 0;

        let err = config.validate().unwrap_err();
        assert!(err.len() >= 5, "got {} errors", err.len());
        assert!(err.to_string().starts_with("validation failed with"));
    }

    #[test]
    fn test_port_empty_backends_and_inverted_timeouts() {
        let mut config = valid_config();
        config.listener.port = 99999;
        config.backends.clear();
        config.health_check.interval_secs = 2;
        config.health_check.timeout_secs = 2;

        let err = config.validate().unwrap_err();
        let codes = codes(&err);
        assert!(codes.contains(&ErrorCode::InvalidPort));
        assert!(err
            .errors()
            .iter()
            .any(|e| e.code() == ErrorCode::InvalidConfig && e.message().contains("at least one backend")));
        assert!(err
            .errors()
            .iter()
            .any(|e| e.code() == ErrorCode::InvalidConfig && e.context("interval_secs").is_some()));
    }

    #[test]
    fn test_single_error_message() {
        let mut config = valid_config();
        config.timeouts.backend_secs = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation failed: [1004] invalid backend timeout: 0s"
        );
    }
}
