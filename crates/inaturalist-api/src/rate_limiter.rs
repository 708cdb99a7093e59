//! Minimum-spacing rate limiter
//!
//! Every dispatched request, including each page fetched by the paginator,
//! takes one slot. The last dispatch time is owned by the limiter, so two
//! clients never share spacing state.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::error::{ApiError, Result};

/// Enforces `min_interval` between consecutive dispatches
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    /// Held across the wait so overlapping callers queue up behind it
    last_dispatch: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
        }
    }

    /// Create a limiter allowing at most `per_second` dispatches per second
    pub fn per_second(per_second: f64) -> Self {
        Self::new(interval_for(per_second))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait for the next dispatch slot and claim it
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        let mut last = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ApiError::Cancelled),
            guard = self.last_dispatch.lock() => guard,
        };

        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                let wait = self.min_interval - elapsed;
                trace!(wait_ms = wait.as_millis() as u64, "Rate limiting request");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ApiError::Cancelled),
                    _ = tokio::time::sleep(wait) => {}
                }
            }
        }

        *last = Some(Instant::now());
        Ok(())
    }
}

/// `1 / per_second`; a rate that does not map to a finite interval never dispatches twice
pub(crate) fn interval_for(per_second: f64) -> Duration {
    Duration::try_from_secs_f64(1.0 / per_second).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_are_spaced() {
        let limiter = RateLimiter::per_second(1.0);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        for _ in 0..4 {
            limiter.acquire(&cancel).await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_call_does_not_wait() {
        let limiter = RateLimiter::per_second(1.0);
        let cancel = CancellationToken::new();
        let start = Instant::now();

        limiter.acquire(&cancel).await.unwrap();

        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_interval_elapsed() {
        let limiter = RateLimiter::per_second(2.0);
        let cancel = CancellationToken::new();

        limiter.acquire(&cancel).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let start = Instant::now();
        limiter.acquire(&cancel).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_are_serialized() {
        let limiter = Arc::new(RateLimiter::per_second(1.0));
        let start = Instant::now();

        let handles: Vec<_> = (0..3)
            .map(|_| {
                let limiter = limiter.clone();
                tokio::spawn(async move {
                    limiter.acquire(&CancellationToken::new()).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_waiting() {
        let limiter = RateLimiter::per_second(0.1);
        let cancel = CancellationToken::new();
        limiter.acquire(&cancel).await.unwrap();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result = limiter.acquire(&cancel).await;
        assert!(matches!(result, Err(ApiError::Cancelled)));
    }
}
