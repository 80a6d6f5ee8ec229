//! Failure classification.
//!
//! # Precedence
//! ```text
//! LogicalFailure            → OperationFailed
//! Connection | Timeout      → UpstreamUnavailable (regardless of partial data)
//! Status 404 / 429          → NotFound / RateLimited, only where the operation remaps them
//! Status (anything else)    → UpstreamHttpError{status}, unknown codes included
//! Decode                    → MalformedResponse
//! ```

use std::fmt;
use std::time::Duration;

use crate::upstream::error::{BoxError, DomainError, ErrorKind, UpstreamStatus};

/// One logical operation against the upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    GetById,
    Create,
    DeleteByName,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::GetById => "get_by_id",
            Self::Create => "create",
            Self::DeleteByName => "delete_by_name",
        }
    }

    /// Whether 404/429 get their own kinds instead of the generic HTTP error.
    fn remaps_status(&self) -> bool {
        matches!(self, Self::GetById)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw failure observed while talking to the upstream.
#[derive(Debug)]
pub enum FailureSignal {
    /// The transport could not complete the exchange.
    Connection(BoxError),
    /// The call deadline elapsed.
    Timeout(Duration),
    /// The upstream answered with a non-2xx status.
    Status { code: Option<u16>, body: String },
    /// The body could not be decoded into the expected envelope.
    Decode(BoxError),
    /// HTTP succeeded but the upstream reported failure.
    LogicalFailure(String),
}

/// Map a failure signal to exactly one domain error.
pub fn classify(signal: FailureSignal, operation: Operation) -> DomainError {
    match signal {
        FailureSignal::LogicalFailure(message) => DomainError::new(ErrorKind::OperationFailed, message),
        FailureSignal::Connection(cause) => {
            DomainError::new(ErrorKind::UpstreamUnavailable, "Unable to connect to upstream service")
                .with_cause(cause)
        }
        FailureSignal::Timeout(after) => DomainError::new(
            ErrorKind::UpstreamUnavailable,
            format!("Upstream did not answer within {} ms", after.as_millis()),
        ),
        FailureSignal::Status { code, body } => classify_status(code, body, operation),
        FailureSignal::Decode(cause) => {
            DomainError::new(ErrorKind::MalformedResponse, "Unable to parse upstream response")
                .with_cause(cause)
        }
    }
}

fn classify_status(code: Option<u16>, body: String, operation: Operation) -> DomainError {
    let status = UpstreamStatus::from_code(code);

    if operation.remaps_status() {
        match status {
            UpstreamStatus::Code(404) => return DomainError::new(ErrorKind::NotFound, "Employee not found"),
            UpstreamStatus::Code(429) => {
                return DomainError::new(ErrorKind::RateLimited, "Too many requests to upstream service")
            }
            _ => {}
        }
    }

    let error = DomainError::new(
        ErrorKind::UpstreamHttpError { status },
        format!("Upstream responded with status {status}"),
    );
    if body.is_empty() {
        error
    } else {
        error.with_cause(format!("upstream body: {body}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> FailureSignal {
        FailureSignal::Status {
            code: Some(code),
            body: String::new(),
        }
    }

    fn refused() -> FailureSignal {
        FailureSignal::Connection(Box::new(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        )))
    }

    #[test]
    fn test_get_by_id_remaps_404_and_429() {
        assert_eq!(classify(status(404), Operation::GetById).kind(), ErrorKind::NotFound);
        assert_eq!(classify(status(429), Operation::GetById).kind(), ErrorKind::RateLimited);
        assert_eq!(
            classify(status(500), Operation::GetById).kind(),
            ErrorKind::UpstreamHttpError { status: UpstreamStatus::Code(500) }
        );
    }

    #[test]
    fn test_not_found_message_is_not_a_connection_message() {
        let err = classify(status(404), Operation::GetById);
        assert!(!err.message().to_lowercase().contains("connect"));
    }

    #[test]
    fn test_other_operations_keep_generic_status() {
        for op in [Operation::List, Operation::Create, Operation::DeleteByName] {
            assert_eq!(
                classify(status(404), op).kind(),
                ErrorKind::UpstreamHttpError { status: UpstreamStatus::Code(404) }
            );
            assert_eq!(
                classify(status(429), op).kind(),
                ErrorKind::UpstreamHttpError { status: UpstreamStatus::Code(429) }
            );
        }
    }

    #[test]
    fn test_connection_and_timeout_always_unavailable() {
        for op in [Operation::List, Operation::GetById, Operation::Create, Operation::DeleteByName] {
            assert_eq!(classify(refused(), op).kind(), ErrorKind::UpstreamUnavailable);
            assert_eq!(
                classify(FailureSignal::Timeout(Duration::from_millis(50)), op).kind(),
                ErrorKind::UpstreamUnavailable
            );
        }
    }

    #[test]
    fn test_unknown_status_does_not_panic() {
        let err = classify(FailureSignal::Status { code: None, body: "?".into() }, Operation::GetById);
        assert_eq!(err.kind(), ErrorKind::UpstreamHttpError { status: UpstreamStatus::Unknown });
        assert_eq!(err.message(), "Upstream responded with status unknown");

        let err = classify(status(999), Operation::List);
        assert_eq!(err.kind(), ErrorKind::UpstreamHttpError { status: UpstreamStatus::Unknown });
    }

    #[test]
    fn test_logical_failure_and_decode() {
        let err = classify(FailureSignal::LogicalFailure("Failed to delete employee Ann".into()), Operation::DeleteByName);
        assert_eq!(err.kind(), ErrorKind::OperationFailed);
        assert_eq!(err.message(), "Failed to delete employee Ann");

        let decode = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = classify(FailureSignal::Decode(Box::new(decode)), Operation::List);
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }
}
