//! Outbound error bodies.

use axum::{
    response::{IntoResponse, Response},
    Json,
};

use crate::upstream::{DomainError, Envelope};

impl IntoResponse for DomainError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let mut chain = Vec::new();
        let mut source = std::error::Error::source(&self);
        while let Some(cause) = source {
            chain.push(cause.to_string());
            source = cause.source();
        }

        if status.is_server_error() {
            tracing::error!(kind = %kind, status = %status, message = %self.message(), causes = ?chain, "Request failed");
        } else {
            tracing::warn!(kind = %kind, status = %status, message = %self.message(), "Request rejected");
        }

        // The cause chain stays in the logs.
        (status, Json(Envelope::<()>::failed(self.message()))).into_response()
    }
}
