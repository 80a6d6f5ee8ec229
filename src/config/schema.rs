//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the employee gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Inbound timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Upstream directory service settings.
    pub upstream: UpstreamConfig,

    /// Admission control for inbound requests.
    pub rate_limit: RateLimitConfig,

    /// Backoff shared by admission retries and upstream retries.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration for inbound request handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed to answer an inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Upstream directory service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Scheme, host and port of the upstream (e.g., "http://localhost:8112").
    pub base_url: String,

    /// Path of the employee collection on the upstream.
    pub resource_path: String,

    /// Header carrying the correlation id, read on inbound requests and sent on outward calls.
    pub trace_header: String,

    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Per-operation timeout and retry policy.
    pub operations: OperationsConfig,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8112".to_string(),
            resource_path: "/api/v1/employee".to_string(),
            trace_header: "X-Trace-Id".to_string(),
            connect_timeout_ms: 2_000,
            operations: OperationsConfig::default(),
        }
    }
}

/// Policies for each upstream operation class.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OperationsConfig {
    pub list: OperationPolicy,
    pub get_by_id: OperationPolicy,
    pub create: OperationPolicy,
    pub delete_by_name: OperationPolicy,
}

impl Default for OperationsConfig {
    fn default() -> Self {
        Self {
            list: OperationPolicy::idempotent(),
            get_by_id: OperationPolicy::idempotent(),
            create: OperationPolicy::default(),
            delete_by_name: OperationPolicy::default(),
        }
    }
}

/// Timeout and retry policy for one operation class.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct OperationPolicy {
    /// Deadline for the whole logical call (all attempts), in milliseconds.
    pub timeout_ms: u64,

    /// Retry with backoff when the upstream cannot be reached.
    pub retry_on_unavailable: bool,
}

impl OperationPolicy {
    fn idempotent() -> Self {
        Self {
            retry_on_unavailable: true,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for OperationPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            retry_on_unavailable: false,
        }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting.
    pub enabled: bool,

    /// Maximum permits held by the bucket (burst size).
    pub capacity: f64,

    /// Permits added per second.
    pub refill_per_second: f64,

    /// Wait with backoff for a permit instead of rejecting at once.
    pub retry_before_reject: bool,

    /// Path prefixes guarded by the limiter.
    pub protected_paths: Vec<String>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1.0,
            refill_per_second: 1.0,
            retry_before_reject: false,
            protected_paths: vec!["/api/employees".to_string()],
        }
    }
}

/// Retry and backoff configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds.
    pub initial_backoff_ms: u64,

    /// Growth factor between consecutive delays.
    pub backoff_multiplier: f64,

    /// Upper bound for any single delay in milliseconds.
    pub max_backoff_ms: u64,

    /// Random extra delay as a fraction of the computed delay (0 disables).
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 100,
            backoff_multiplier: 2.0,
            max_backoff_ms: 1_000,
            jitter_ratio: 0.0,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty output for development, JSON for log aggregation.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
