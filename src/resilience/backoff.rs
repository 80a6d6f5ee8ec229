//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

use crate::config::RetryConfig;

/// Backoff parameters shared by every retry sequence in the process.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    initial_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
    max_attempts: u32,
    jitter_ratio: f64,
}

impl BackoffPolicy {
    /// A multiplier below 1.0 (or non-finite) is treated as 1.0 so delays never shrink.
    pub fn new(initial_delay: Duration, multiplier: f64, max_delay: Duration, max_attempts: u32) -> Self {
        let multiplier = if multiplier.is_finite() { multiplier.max(1.0) } else { 1.0 };
        Self {
            initial_delay,
            multiplier,
            max_delay,
            max_attempts,
            jitter_ratio: 0.0,
        }
    }

    /// Spread jittered delays over `[d, d * (1 + ratio)]`, clamped to the max delay.
    ///
    /// Non-finite ratios disable jitter.
    pub fn with_jitter(mut self, ratio: f64) -> Self {
        self.jitter_ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            Duration::from_millis(config.initial_backoff_ms),
            config.backoff_multiplier,
            Duration::from_millis(config.max_backoff_ms),
            config.max_attempts,
        )
        .with_jitter(config.jitter_ratio)
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    pub fn jitter_ratio(&self) -> f64 {
        self.jitter_ratio
    }

    /// `min(max_delay, initial_delay * multiplier^attempt)`.
    ///
    /// Deterministic: jitter is never applied here.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return self.initial_delay.min(self.max_delay);
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let max_secs = self.max_delay.as_secs_f64();

        if !scaled.is_finite() || scaled >= max_secs {
            return self.max_delay;
        }
        Duration::from_secs_f64(scaled.max(0.0))
    }

    /// [`delay_for_attempt`](Self::delay_for_attempt) plus random jitter.
    pub fn jittered_delay(&self, attempt: u32) -> Duration {
        let base = self.delay_for_attempt(attempt);
        if self.jitter_ratio <= 0.0 || base.is_zero() {
            return base;
        }

        let factor = rand::thread_rng().gen_range(0.0..=self.jitter_ratio);
        base.mul_f64(1.0 + factor).min(self.max_delay)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}
