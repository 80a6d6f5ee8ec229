//! Upstream directory integration.
//!
//! # Data Flow
//! ```text
//! Service call (list / get / create / delete)
//!     → client.rs (build request, attach trace id, deadline, retries)
//!     → reqwest transport
//!     → On failure: classify.rs (signal → ErrorKind)
//!     → error.rs (DomainError handed back to the caller)
//!     → types.rs (envelope decoding on success)
//! ```
//!
//! # Design Decisions
//! - Callers only ever see `DomainError`, never transport errors
//! - Classification is a pure function, tested without a network
//! - Input validation runs before any outward call

pub mod classify;
pub mod client;
pub mod error;
pub mod types;

pub use classify::{classify, FailureSignal, Operation};
pub use client::{UpstreamClient, UpstreamSetupError};
pub use error::{DomainError, DomainResult, ErrorKind, UpstreamStatus};
pub use types::{CreateEmployeeInput, Employee, Envelope};
