//! Correlation ids.
//!
//! # Responsibilities
//! - Carry the inbound trace id through handlers and services
//! - Propagate it unchanged on every upstream request
//!
//! # Design Decisions
//! - Caller-supplied ids are kept verbatim; missing ones become UUID v4
//! - Only ids that are valid header values are accepted

use std::fmt;

use axum::http::HeaderValue;
use uuid::Uuid;

/// Default header carrying the trace id in and out.
pub const TRACE_ID_HEADER: &str = "x-trace-id";

/// Correlation id for one inbound request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceId(String);

impl TraceId {
    /// A fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Use the inbound header when it holds a non-blank visible value.
    pub fn from_header(value: Option<&HeaderValue>) -> Option<Self> {
        let value = value?.to_str().ok()?.trim();
        if value.is_empty() {
            None
        } else {
            Some(Self(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_header_value(&self) -> Option<HeaderValue> {
        HeaderValue::from_str(&self.0).ok()
    }
}

impl From<&str> for TraceId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
