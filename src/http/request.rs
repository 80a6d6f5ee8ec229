//! Inbound request handling.
//!
//! # Responsibilities
//! - Read the caller's trace id, or mint one, as early as possible
//! - Make it available to handlers through request extensions
//! - Echo it back on the response

use axum::{
    extract::{Request, State},
    http::HeaderName,
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::observability::TraceId;

/// Attach a [`TraceId`] to the request and run the rest of the stack inside its span.
///
/// `header` is the same name used on upstream calls, so one id flows end to end.
pub async fn trace_id_middleware(State(header): State<HeaderName>, mut request: Request, next: Next) -> Response {
    let trace = TraceId::from_header(request.headers().get(&header)).unwrap_or_else(TraceId::generate);

    request.extensions_mut().insert(trace.clone());

    let span = tracing::info_span!(
        "request",
        trace_id = %trace,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Some(value) = trace.to_header_value() {
        response.headers_mut().insert(header, value);
    }
    response
}
