//! Deadline helpers for outward calls.
//!
//! Every upstream operation gets a single deadline covering all of its
//! attempts and backoff sleeps. Attempts run under `tokio::time::timeout_at`,
//! which drops the in-flight request when the deadline passes.

use std::time::Duration;

use tokio::time::Instant;

/// Deadline for a call that starts now.
pub fn deadline_after(timeout: Duration) -> Instant {
    Instant::now() + timeout
}

/// Whether sleeping for `delay` still leaves time before `deadline`.
pub fn fits_before(deadline: Instant, delay: Duration) -> bool {
    Instant::now()
        .checked_add(delay)
        .is_some_and(|wake| wake < deadline)
}
