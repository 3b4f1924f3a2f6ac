//! Bounded retry with a constant delay.
//!
//! Every network-facing stage goes through [`RetryPolicy::run`]. There is no
//! retryable/fatal distinction: any failure of the wrapped operation is retried
//! until the attempt bound is hit.

use crate::progress::RunObserver;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempts observed in every upstream feed.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Pause between attempts. Constant, not exponential.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Retry bound and inter-attempt delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_DELAY,
        }
    }
}

/// The operation failed on every allowed attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryExhausted<E> {
    pub attempts: u32,
    pub last: E,
}

impl RetryPolicy {
    /// A policy with at least one attempt.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or `max_attempts` is reached.
    ///
    /// `op` receives the 1-based attempt index. Each outcome is reported to
    /// the observer. Returns the first success, or the last error.
    pub async fn run<T, E, F, Fut>(
        &self,
        label: &str,
        observer: &RunObserver,
        mut op: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match op(attempt).await {
                Ok(value) => {
                    observer.attempt_succeeded(label, attempt, max_attempts);
                    return Ok(value);
                }
                Err(e) => {
                    observer.attempt_failed(label, attempt, max_attempts, &e.to_string());
                    if attempt >= max_attempts {
                        return Err(RetryExhausted { attempts: attempt, last: e });
                    }
                    tracing::info!("retrying {label} after {}ms", self.delay.as_millis());
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
