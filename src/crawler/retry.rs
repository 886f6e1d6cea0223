//! Bounded retries with exponential backoff and jitter
//!
//! | Condition | Action |
//! |-----------|--------|
//! | Non-retryable error (HTTP 404) | Returned immediately, no delay |
//! | Retryable error, attempts left | `2^attempt * 1s + U(0, 1.5s)`, then retry |
//! | Retryable error, last attempt | Last error returned unchanged |
//!
//! This is the only place in the crate that retries anything; the HTTP client
//! is built without retries of its own.

use super::pacing::{Randomness, Sleeper};
use crate::FetchError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Classifies failures for [`RetryPolicy::run`]
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for FetchError {
    fn is_retryable(&self) -> bool {
        FetchError::is_retryable(self)
    }
}

/// Bookkeeping for one wrapped invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryContext {
    pub label: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub last_error: Option<String>,
}

impl RetryContext {
    fn new(label: &str, max_attempts: u32) -> Self {
        Self {
            label: label.to_string(),
            attempt: 0,
            max_attempts,
            last_error: None,
        }
    }

    fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

/// Retry parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Multiplied by `2^attempt`
    pub base_delay_ms: u64,
    /// Upper bound of the uniform jitter added to every backoff
    pub max_jitter_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 1000,
            max_jitter_ms: 1500,
        }
    }
}

impl RetryPolicy {
    /// Creates the default policy with a different attempt cap (0 is raised to 1)
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Backoff after failed attempt `attempt`, excluding jitter
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u64.saturating_pow(attempt);
        Duration::from_millis(factor.saturating_mul(self.base_delay_ms))
    }

    /// Backoff after failed attempt `attempt`, including jitter
    pub fn delay_for(&self, attempt: u32, rng: &dyn Randomness) -> Duration {
        self.base_delay(attempt) + Duration::from_millis(rng.millis_between(0, self.max_jitter_ms))
    }

    /// Runs `operation` until it succeeds, fails for good, or runs out of attempts
    ///
    /// `operation` receives the 1-based attempt number.
    ///
    /// # Arguments
    ///
    /// * `label` - Names the operation in log lines
    /// * `sleeper` - Performs the backoff waits
    /// * `rng` - Draws the jitter
    /// * `operation` - Produces one attempt
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        sleeper: &dyn Sleeper,
        rng: &dyn Randomness,
        mut operation: F,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + fmt::Display,
    {
        let mut ctx = RetryContext::new(label, self.max_attempts.max(1));

        loop {
            ctx.attempt += 1;

            let err = match operation(ctx.attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }

            tracing::warn!(
                "{} failed (Attempt {}/{}): {}",
                ctx.label,
                ctx.attempt,
                ctx.max_attempts,
                err
            );
            ctx.last_error = Some(err.to_string());

            if ctx.exhausted() {
                return Err(err);
            }

            sleeper.sleep(self.delay_for(ctx.attempt, rng)).await;
        }
    }
}
