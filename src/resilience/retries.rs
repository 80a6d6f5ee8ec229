//! Retry bookkeeping.
//!
//! # Responsibilities
//! - Own the attempt counter for one logical call
//! - Enforce the attempt bound the backoff policy leaves to its caller
//! - Decide which failures are worth another attempt
//!
//! # Design Decisions
//! - Only transient connectivity failures are retried
//! - HTTP errors, malformed bodies and timeouts are terminal
//! - A schedule is created fresh per call and dropped when the call ends

use std::time::Duration;

use crate::resilience::backoff::BackoffPolicy;
use crate::upstream::classify::FailureSignal;

/// Attempt counter over a [`BackoffPolicy`].
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    policy: BackoffPolicy,
    max_attempts: u32,
    attempts: u32,
}

impl RetrySchedule {
    /// A schedule allowing `policy.max_attempts()` attempts (at least one).
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::with_max_attempts(policy, policy.max_attempts())
    }

    /// A schedule allowing exactly one attempt.
    pub fn single(policy: BackoffPolicy) -> Self {
        Self::with_max_attempts(policy, 1)
    }

    fn with_max_attempts(policy: BackoffPolicy, max_attempts: u32) -> Self {
        Self {
            policy,
            max_attempts: max_attempts.max(1),
            attempts: 0,
        }
    }

    /// Record the start of an attempt. Returns the 1-based attempt number.
    pub fn begin_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Attempts started so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay to wait before the next attempt, or `None` once the bound is reached.
    ///
    /// The first retry waits `delay_for_attempt(0)`, the second
    /// `delay_for_attempt(1)`, and so on.
    pub fn next_delay(&self) -> Option<Duration> {
        if self.attempts == 0 || self.attempts >= self.max_attempts {
            return None;
        }
        Some(self.policy.jittered_delay(self.attempts - 1))
    }
}

/// Whether a failed attempt may be repeated unchanged.
pub fn is_retryable(signal: &FailureSignal) -> bool {
    matches!(signal, FailureSignal::Connection(_))
}
