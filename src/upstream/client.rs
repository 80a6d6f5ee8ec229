//! Upstream directory client with timeout, retry and error classification.
//!
//! # Responsibilities
//! - Issue list / get / create / delete calls against the upstream
//! - Propagate the caller's trace id on every request
//! - Enforce the per-operation deadline and retry policy
//! - Return decoded results or a classified `DomainError`, never a raw transport error

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderName;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::timeout_at;
use url::Url;

use crate::config::{OperationPolicy, OperationsConfig, RetryConfig, UpstreamConfig};
use crate::observability::{metrics, TraceId};
use crate::resilience::retries::{is_retryable, RetrySchedule};
use crate::resilience::timeouts::{deadline_after, fits_before};
use crate::resilience::{BackoffPolicy, Sleeper, TokioSleeper};
use crate::upstream::classify::{classify, FailureSignal, Operation};
use crate::upstream::error::{DomainError, DomainResult};
use crate::upstream::types::{CreateEmployeeInput, DeleteByNameRequest, Employee, Envelope};

/// Errors building an [`UpstreamClient`] from configuration.
#[derive(Debug, Error)]
pub enum UpstreamSetupError {
    #[error("Invalid upstream URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid trace header '{0}'")]
    InvalidTraceHeader(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client for the upstream employee directory.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    base_url: Url,
    resource_segments: Vec<String>,
    trace_header: HeaderName,
    operations: OperationsConfig,
    backoff: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl UpstreamClient {
    /// Create a client that sleeps on the Tokio timer between retries.
    pub fn new(config: &UpstreamConfig, retry: &RetryConfig) -> Result<Self, UpstreamSetupError> {
        Self::with_sleeper(config, retry, Arc::new(TokioSleeper))
    }

    /// Create a client with an explicit sleeper.
    pub fn with_sleeper(
        config: &UpstreamConfig,
        retry: &RetryConfig,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, UpstreamSetupError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| UpstreamSetupError::InvalidUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamSetupError::InvalidUrl {
                url: config.base_url.clone(),
                reason: "URL cannot be a base".to_string(),
            });
        }

        let trace_header = HeaderName::from_bytes(config.trace_header.as_bytes())
            .map_err(|_| UpstreamSetupError::InvalidTraceHeader(config.trace_header.clone()))?;

        let http = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .no_proxy()
            .build()?;

        let resource_segments = config
            .resource_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        tracing::info!(
            base_url = %base_url,
            resource_path = %config.resource_path,
            "Upstream client initialized"
        );

        Ok(Self {
            http,
            base_url,
            resource_segments,
            trace_header,
            operations: config.operations.clone(),
            backoff: BackoffPolicy::from_config(retry),
            sleeper,
        })
    }

    /// Fetch every employee.
    pub async fn list_all(&self, trace: &TraceId) -> DomainResult<Vec<Employee>> {
        let op = Operation::List;
        tracing::info!(trace_id = %trace, "Fetching all employees from upstream");

        let url = self.endpoint(None);
        let body = self.exchange(op, trace, |http| http.get(url.clone())).await?;
        decode_data(op, &body)
    }

    /// Fetch one employee; 404 and 429 come back as `NotFound` and `RateLimited`.
    pub async fn get_by_id(&self, id: &str, trace: &TraceId) -> DomainResult<Employee> {
        let op = Operation::GetById;
        if id.trim().is_empty() {
            return Err(DomainError::validation("Employee id must not be blank"));
        }
        tracing::info!(trace_id = %trace, id = %id, "Fetching employee from upstream");

        let url = self.endpoint(Some(id));
        let body = self.exchange(op, trace, |http| http.get(url.clone())).await?;
        decode_data(op, &body)
    }

    /// Create an employee after validating the input locally.
    pub async fn create(&self, input: &CreateEmployeeInput, trace: &TraceId) -> DomainResult<Employee> {
        let op = Operation::Create;
        input.validate()?;
        tracing::info!(trace_id = %trace, name = %input.name, "Creating employee on upstream");

        let url = self.endpoint(None);
        let body = self
            .exchange(op, trace, |http| http.post(url.clone()).json(input))
            .await?;
        decode_data(op, &body)
    }

    /// Delete by name. A success status with a false or absent `data` flag is `OperationFailed`.
    pub async fn delete_by_name(&self, name: &str, trace: &TraceId) -> DomainResult<bool> {
        let op = Operation::DeleteByName;
        if name.trim().is_empty() {
            return Err(DomainError::validation("Employee name must not be blank"));
        }
        tracing::info!(trace_id = %trace, name = %name, "Deleting employee on upstream");

        let url = self.endpoint(None);
        let payload = DeleteByNameRequest { name };
        let body = self
            .exchange(op, trace, |http| http.delete(url.clone()).json(&payload))
            .await?;

        let envelope: Envelope<bool> = decode(op, &body)?;
        if envelope.data == Some(true) {
            tracing::info!(trace_id = %trace, name = %name, "Employee deleted");
            Ok(true)
        } else {
            Err(classify(
                FailureSignal::LogicalFailure(format!("Failed to delete employee {name}")),
                op,
            ))
        }
    }

    fn endpoint(&self, id: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(&self.resource_segments);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        url
    }

    fn policy(&self, op: Operation) -> OperationPolicy {
        match op {
            Operation::List => self.operations.list,
            Operation::GetById => self.operations.get_by_id,
            Operation::Create => self.operations.create,
            Operation::DeleteByName => self.operations.delete_by_name,
        }
    }

    /// Run one logical call and return the body of a 2xx answer.
    ///
    /// Connection failures are retried when the operation allows it and the
    /// backoff still fits before the deadline. Everything else is terminal.
    async fn exchange<F>(&self, op: Operation, trace: &TraceId, build: F) -> DomainResult<String>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let policy = self.policy(op);
        let deadline = deadline_after(policy.timeout());
        let mut schedule = if policy.retry_on_unavailable {
            RetrySchedule::new(self.backoff)
        } else {
            RetrySchedule::single(self.backoff)
        };
        let start = Instant::now();

        loop {
            let attempt = schedule.begin_attempt();
            let request = build(&self.http).header(&self.trace_header, trace.as_str());

            let signal = match timeout_at(deadline, send(request)).await {
                Ok(Ok((status, body))) if status.is_success() => {
                    metrics::record_upstream_call(op.as_str(), "success", start);
                    return Ok(body);
                }
                Ok(Ok((status, body))) => {
                    tracing::error!(
                        trace_id = %trace,
                        operation = %op,
                        status = %status,
                        body = %body,
                        "Upstream responded with error"
                    );
                    FailureSignal::Status {
                        code: Some(status.as_u16()),
                        body,
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        trace_id = %trace,
                        operation = %op,
                        attempt,
                        error = %e,
                        "Cannot connect to upstream"
                    );
                    FailureSignal::Connection(Box::new(e))
                }
                Err(_) => {
                    tracing::error!(
                        trace_id = %trace,
                        operation = %op,
                        attempt,
                        timeout_ms = policy.timeout_ms,
                        "Upstream call timed out"
                    );
                    FailureSignal::Timeout(policy.timeout())
                }
            };

            if is_retryable(&signal) {
                if let Some(delay) = schedule.next_delay().filter(|d| fits_before(deadline, *d)) {
                    tracing::warn!(
                        trace_id = %trace,
                        operation = %op,
                        attempt,
                        delay = ?delay,
                        "Retrying upstream call"
                    );
                    metrics::record_retry(op.as_str());
                    self.sleeper.sleep(delay).await;
                    continue;
                }
            }

            let error = classify(signal, op);
            metrics::record_upstream_call(op.as_str(), error.kind().as_str(), start);
            return Err(error);
        }
    }
}

impl std::fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamClient")
            .field("base_url", &self.base_url.as_str())
            .field("trace_header", &self.trace_header)
            .field("operations", &self.operations)
            .field("backoff", &self.backoff)
            .finish()
    }
}

async fn send(request: RequestBuilder) -> Result<(StatusCode, String), reqwest::Error> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;
    Ok((status, body))
}

fn decode<T: DeserializeOwned>(op: Operation, body: &str) -> DomainResult<T> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(operation = %op, error = %e, "Error parsing JSON from upstream");
        classify(FailureSignal::Decode(Box::new(e)), op)
    })
}

/// Decode an envelope whose `data` must be present.
fn decode_data<T: DeserializeOwned>(op: Operation, body: &str) -> DomainResult<T> {
    let envelope: Envelope<T> = decode(op, body)?;
    envelope
        .data
        .ok_or_else(|| classify(FailureSignal::Decode("envelope has no data".into()), op))
}
