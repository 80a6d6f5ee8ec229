//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (rates > 0, multiplier > 1, timeouts > 0)
//! - Check addresses, URLs and header names parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use url::Url;

use crate::config::schema::{GatewayConfig, OperationPolicy};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Check every semantic constraint and report all failures together.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    let rate = &config.rate_limit;
    if !(rate.capacity.is_finite() && rate.capacity > 0.0) {
        errors.push(ValidationError::new(
            "rate_limit.capacity",
            format!("must be a positive number (got {})", rate.capacity),
        ));
    }
    if !(rate.refill_per_second.is_finite() && rate.refill_per_second > 0.0) {
        errors.push(ValidationError::new(
            "rate_limit.refill_per_second",
            format!("must be a positive number (got {})", rate.refill_per_second),
        ));
    }
    if rate.protected_paths.iter().any(|p| !p.starts_with('/')) {
        errors.push(ValidationError::new("rate_limit.protected_paths", "every path must start with '/'"));
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be at least 1"));
    }
    if !(retry.backoff_multiplier.is_finite() && retry.backoff_multiplier > 1.0) {
        errors.push(ValidationError::new(
            "retry.backoff_multiplier",
            format!("must be greater than 1.0 (got {})", retry.backoff_multiplier),
        ));
    }
    if retry.initial_backoff_ms > retry.max_backoff_ms {
        errors.push(ValidationError::new(
            "retry.initial_backoff_ms",
            "must not exceed retry.max_backoff_ms",
        ));
    }
    if !(0.0..=1.0).contains(&retry.jitter_ratio) {
        errors.push(ValidationError::new(
            "retry.jitter_ratio",
            format!("must be between 0 and 1 (got {})", retry.jitter_ratio),
        ));
    }

    let upstream = &config.upstream;
    match Url::parse(&upstream.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && !url.cannot_be_a_base() => {}
        _ => errors.push(ValidationError::new(
            "upstream.base_url",
            format!("'{}' is not an http(s) base URL", upstream.base_url),
        )),
    }
    if !upstream.resource_path.starts_with('/') {
        errors.push(ValidationError::new("upstream.resource_path", "must start with '/'"));
    }
    if HeaderName::from_bytes(upstream.trace_header.as_bytes()).is_err() {
        errors.push(ValidationError::new(
            "upstream.trace_header",
            format!("'{}' is not a valid header name", upstream.trace_header),
        ));
    }
    if upstream.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("upstream.connect_timeout_ms", "must be greater than 0"));
    }

    let operations: [(&'static str, &OperationPolicy); 4] = [
        ("upstream.operations.list.timeout_ms", &upstream.operations.list),
        ("upstream.operations.get_by_id.timeout_ms", &upstream.operations.get_by_id),
        ("upstream.operations.create.timeout_ms", &upstream.operations.create),
        ("upstream.operations.delete_by_name.timeout_ms", &upstream.operations.delete_by_name),
    ];
    for (field, policy) in operations {
        if policy.timeout_ms == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
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
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = GatewayConfig::default();
        config.rate_limit.capacity = 0.0;
        config.rate_limit.refill_per_second = -1.0;
        config.retry.backoff_multiplier = 1.0;
        config.upstream.base_url = "not a url".to_string();
        config.upstream.operations.create.timeout_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "rate_limit.capacity",
                "rate_limit.refill_per_second",
                "retry.backoff_multiplier",
                "upstream.base_url",
                "upstream.operations.create.timeout_ms",
            ]
        );
    }

    #[test]
    fn test_rejects_non_finite_rates() {
        let mut config = GatewayConfig::default();
        config.rate_limit.refill_per_second = f64::NAN;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "rate_limit.refill_per_second");
    }

    #[test]
    fn test_rejects_bad_trace_header() {
        let mut config = GatewayConfig::default();
        config.upstream.trace_header = "X Trace".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("upstream.trace_header"));
    }
}
