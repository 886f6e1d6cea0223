//! Bounded-parallelism task queue
//!
//! This module handles:
//! - An unbounded FIFO queue of submitted tasks
//! - Starting at most `max_concurrency` of them at a time
//! - Settling every submission independently, including on panic

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

/// Why a submitted task produced no value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LimiterError {
    #[error("task panicked")]
    Panicked,

    #[error("task was cancelled before completing")]
    Cancelled,
}

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

struct LimiterState {
    active: usize,
    queue: VecDeque<Job>,
}

/// Caps how many submitted tasks run at once
///
/// Tasks submitted while below capacity start immediately; the rest wait in
/// submission order. Cloning yields another handle to the same queue.
/// Submitting requires a running tokio runtime.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    max_concurrency: usize,
    state: Arc<Mutex<LimiterState>>,
}

impl ConcurrencyLimiter {
    /// Creates a limiter; a limit of 0 is raised to 1
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            state: Arc::new(Mutex::new(LimiterState {
                active: 0,
                queue: VecDeque::new(),
            })),
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Tasks currently running
    pub fn active(&self) -> usize {
        self.lock().active
    }

    /// Tasks waiting for a slot
    pub fn queued(&self) -> usize {
        self.lock().queue.len()
    }

    /// Queues `task` and returns a handle resolving to its output
    pub fn submit<F, T>(&self, task: F) -> TaskHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();

        let job: Job = Box::pin(async move {
            // Inner spawn so a panic settles this handle instead of the slot
            let outcome = tokio::spawn(task).await.map_err(|e| {
                if e.is_panic() {
                    LimiterError::Panicked
                } else {
                    LimiterError::Cancelled
                }
            });
            let _ = tx.send(outcome);
        });

        self.lock().queue.push_back(job);
        self.pump();

        TaskHandle { rx }
    }

    fn pump(&self) {
        let mut state = self.lock();

        while state.active < self.max_concurrency {
            let Some(job) = state.queue.pop_front() else {
                break;
            };
            state.active += 1;

            let limiter = self.clone();
            tokio::spawn(async move {
                job.await;
                limiter.lock().active -= 1;
                limiter.pump();
            });
        }

        tracing::trace!(
            "Limiter: {} active, {} queued (max {})",
            state.active,
            state.queue.len(),
            self.max_concurrency
        );
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ConcurrencyLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ConcurrencyLimiter")
            .field("max_concurrency", &self.max_concurrency)
            .field("active", &state.active)
            .field("queued", &state.queue.len())
            .finish()
    }
}

/// Resolves to the output of one submitted task
#[derive(Debug)]
pub struct TaskHandle<T> {
    rx: oneshot::Receiver<Result<T, LimiterError>>,
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, LimiterError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(LimiterError::Cancelled)))
    }
}
