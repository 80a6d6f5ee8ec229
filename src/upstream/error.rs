//! Domain error taxonomy.

use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

/// Boxed lower-level error kept only for diagnostics.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Status reported by the upstream, when it could be understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamStatus {
    Code(u16),
    Unknown,
}

impl UpstreamStatus {
    /// Anything outside `100..=599` (or absent) is `Unknown`.
    pub fn from_code(code: Option<u16>) -> Self {
        match code {
            Some(code) if (100..=599).contains(&code) => Self::Code(code),
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for UpstreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code}"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Closed set of caller-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Connection refused, reset or timed out. Transient.
    UpstreamUnavailable,
    /// The requested resource does not exist.
    NotFound,
    /// The upstream throttled this client.
    RateLimited,
    /// Any other non-2xx answer. Not retried.
    UpstreamHttpError { status: UpstreamStatus },
    /// The body did not match the expected envelope.
    MalformedResponse,
    /// The upstream reported a logical failure despite HTTP success.
    OperationFailed,
    /// Caller input violated a precondition; nothing was sent.
    ValidationFailed,
}

impl ErrorKind {
    /// Nearest inbound HTTP status for this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamHttpError { .. } | Self::MalformedResponse => StatusCode::BAD_GATEWAY,
            Self::OperationFailed => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationFailed => StatusCode::BAD_REQUEST,
        }
    }

    /// Whether a later retry by the caller might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable | Self::RateLimited)
    }

    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::NotFound => "not_found",
            Self::RateLimited => "rate_limited",
            Self::UpstreamHttpError { .. } => "upstream_http_error",
            Self::MalformedResponse => "malformed_response",
            Self::OperationFailed => "operation_failed",
            Self::ValidationFailed => "validation_failed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UpstreamHttpError { status } => write!(f, "upstream_http_error({status})"),
            other => f.write_str(other.as_str()),
        }
    }
}

/// A classified failure. Immutable once built.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct DomainError {
    kind: ErrorKind,
    message: String,
    #[source]
    cause: Option<BoxError>,
}

impl DomainError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }
}

/// Result type for upstream operations.
pub type DomainResult<T> = Result<T, DomainError>;
