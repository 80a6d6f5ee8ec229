//! HTTP front end.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → request.rs (trace id read or generated, span opened)
//!     → security::admission (token bucket on protected paths)
//!     → handlers.rs (extract, call EmployeeService)
//!     → response.rs (DomainError → status + failure envelope)
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::trace_id_middleware;
pub use server::{AppState, GatewayServer, ServerError};
