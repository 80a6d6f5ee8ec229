//! Token bucket admission gate.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::config::{RateLimitConfig, RetryConfig};
use crate::resilience::{BackoffPolicy, Clock, Sleeper, SystemClock, TokioSleeper};

/// Rejected limiter configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RateLimitError {
    #[error("Rate limiter capacity must be a positive number (got {0})")]
    InvalidCapacity(f64),

    #[error("Rate limiter refill rate must be a positive number (got {0})")]
    InvalidRefillRate(f64),
}

/// Decides whether an inbound unit of work may proceed.
pub trait AdmissionGate: Send + Sync {
    /// Take a permit if one is available right now.
    fn try_acquire(&self) -> bool;

    /// Like `try_acquire`, but back off and try again before giving up.
    fn try_acquire_with_retry(&self) -> BoxFuture<'_, bool>;
}

/// A simple token bucket.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, now: Instant, capacity: f64, refill_rate: f64) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = self.last_update.max(now);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Process-wide rate limiter over a single token bucket.
pub struct RateLimiter {
    bucket: Mutex<TokenBucket>,
    capacity: f64,
    refill_rate: f64,
    backoff: BackoffPolicy,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
}

impl RateLimiter {
    /// Build a limiter with a full bucket. Fails fast on non-positive settings.
    pub fn new(
        capacity: f64,
        refill_rate: f64,
        backoff: BackoffPolicy,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, RateLimitError> {
        if !(capacity.is_finite() && capacity > 0.0) {
            return Err(RateLimitError::InvalidCapacity(capacity));
        }
        if !(refill_rate.is_finite() && refill_rate > 0.0) {
            return Err(RateLimitError::InvalidRefillRate(refill_rate));
        }

        Ok(Self {
            bucket: Mutex::new(TokenBucket::new(capacity, clock.now())),
            capacity,
            refill_rate,
            backoff,
            clock,
            sleeper,
        })
    }

    /// Limiter on the system clock and Tokio timer.
    pub fn from_config(rate: &RateLimitConfig, retry: &RetryConfig) -> Result<Self, RateLimitError> {
        Self::new(
            rate.capacity,
            rate.refill_per_second,
            BackoffPolicy::from_config(retry),
            Arc::new(SystemClock),
            Arc::new(TokioSleeper),
        )
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn refill_rate(&self) -> f64 {
        self.refill_rate
    }

    /// Take a permit if one is available. Never blocks.
    pub fn try_acquire(&self) -> bool {
        let now = self.clock.now();
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        bucket.try_acquire(now, self.capacity, self.refill_rate)
    }

    /// Try up to `max_attempts` times, sleeping the backoff delay between attempts.
    ///
    /// The bucket lock is released before every sleep.
    pub async fn try_acquire_with_retry(&self) -> bool {
        let max_attempts = self.backoff.max_attempts().max(1);

        for attempt in 0..max_attempts {
            if self.try_acquire() {
                if attempt > 0 {
                    tracing::info!(retries = attempt, "Acquired permit after retrying");
                }
                return true;
            }
            if attempt + 1 == max_attempts {
                break;
            }

            let delay = self.backoff.jittered_delay(attempt);
            tracing::warn!(attempt = attempt + 1, delay = ?delay, "Rate limit exceeded, backing off");
            self.sleeper.sleep(delay).await;
        }

        tracing::error!(attempts = max_attempts, "Failed to acquire permit");
        false
    }
}

impl AdmissionGate for RateLimiter {
    fn try_acquire(&self) -> bool {
        RateLimiter::try_acquire(self)
    }

    fn try_acquire_with_retry(&self) -> BoxFuture<'_, bool> {
        Box::pin(RateLimiter::try_acquire_with_retry(self))
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("capacity", &self.capacity)
            .field("refill_rate", &self.refill_rate)
            .field("backoff", &self.backoff)
            .finish()
    }
}
