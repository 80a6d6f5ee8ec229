//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to upstream:
//!     → timeouts.rs (one deadline for the whole logical call)
//!     → On connection failure: retries.rs (attempt bound, retryable check)
//!     → backoff.rs (delay before the next attempt)
//!     → clock.rs (sleep on the injected sleeper)
//!
//! Inbound admission (retry-before-reject mode):
//!     → backoff.rs delays between token bucket attempts
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for transient connectivity failures
//! - Delays are deterministic unless jitter is configured
//! - Time and sleep are injected so tests never wait on the wall clock

pub mod backoff;
pub mod clock;
pub mod retries;
#[cfg(any(test, feature = "test-util"))]
pub mod test_util;
pub mod timeouts;

pub use backoff::BackoffPolicy;
pub use clock::{Clock, Sleeper, SystemClock, TokioSleeper};
#[cfg(any(test, feature = "test-util"))]
pub use test_util::{ManualClock, RecordingSleeper};
pub use retries::RetrySchedule;
