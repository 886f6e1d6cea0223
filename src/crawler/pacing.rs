//! Timed suspension and randomness used for stealth pacing
//!
//! Every wait in a crawl (pre-request delay, retry backoff, inter-page delay)
//! goes through a [`Sleeper`], and every random choice (User-Agent, delay
//! length, jitter) goes through a [`Randomness`]. Tests swap in
//! [`NoopSleeper`] / [`RecordingSleeper`] and [`FixedRandomness`].

use async_trait::async_trait;
use rand::Rng;
use std::sync::Mutex;
use std::time::Duration;

/// Uniform delay window applied before every fetch attempt
pub const PRE_REQUEST_DELAY: DelayRange = DelayRange::new(500, 2000);

/// Uniform delay window between two successfully fetched pages
pub const PAGE_DELAY: DelayRange = DelayRange::new(1000, 3000);

/// A schedulable delay
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Source of random choices
pub trait Randomness: Send + Sync {
    /// Returns an index in `0..len`; `len` must be non-zero
    fn index(&self, len: usize) -> usize;

    /// Returns a value uniformly drawn from `lo..=hi`
    fn millis_between(&self, lo: u64, hi: u64) -> u64;
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Returns immediately and remembers every requested duration
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Durations requested so far, in order
    pub fn recorded(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .map(|sleeps| sleeps.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let mut sleeps = self
            .sleeps
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        sleeps.push(duration);
    }
}

/// Thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomness;

impl Randomness for ThreadRandomness {
    fn index(&self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }

    fn millis_between(&self, lo: u64, hi: u64) -> u64 {
        if hi <= lo {
            return lo;
        }
        rand::rng().random_range(lo..=hi)
    }
}

/// Always picks the first entry and the lower bound
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedRandomness;

impl Randomness for FixedRandomness {
    fn index(&self, _len: usize) -> usize {
        0
    }

    fn millis_between(&self, lo: u64, _hi: u64) -> u64 {
        lo
    }
}

/// Inclusive millisecond window for a randomized wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    /// A window that always yields zero
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }

    pub fn sample(&self, rng: &dyn Randomness) -> Duration {
        Duration::from_millis(rng.millis_between(self.min_ms, self.max_ms))
    }
}
