//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → admission.rs (is the path protected? is limiting enabled?)
//!     → rate_limit.rs (token bucket permit, optionally with backoff)
//!     → 429 and stop, or pass to the handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: a denied permit never reaches business logic
//! - The gate protects this service's capacity, independent of upstream retries
//! - Single in-process bucket; no cross-instance coordination

pub mod admission;
pub mod rate_limit;

pub use admission::{admission_middleware, Admission, AdmissionMode, RequestInterceptor, REJECTION_MESSAGE};
pub use rate_limit::{AdmissionGate, RateLimitError, RateLimiter};
