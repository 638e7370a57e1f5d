//! Pacing between collaborator calls.
//!
//! The messaging network flags accounts that look up numbers too quickly, so
//! batch verification pauses after every lookup. The policy is injectable:
//! production uses a fixed delay (or a shared token bucket), tests use none.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::config::{BatchConfig, PacingMode};

/// Pause policy applied after each collaborator lookup in a batch.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

/// Sleep the same delay every time.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

#[async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

/// No pacing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}
}

struct Bucket {
    tokens: f64,
    last_update: Instant,
}

impl Bucket {
    fn refill(&mut self, capacity: f64, refill_rate: f64) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;
    }
}

/// Token bucket shared by every batch in the process.
///
/// Each pause takes one token; when the bucket is empty the caller reserves
/// the next token and sleeps until it refills, so concurrent batches queue
/// behind each other instead of bursting.
pub struct TokenBucket {
    bucket: Mutex<Bucket>,
    capacity: f64,
    refill_rate: f64,
}

impl TokenBucket {
    pub fn new(tokens_per_second: f64, burst: u32) -> Self {
        let capacity = f64::from(burst.max(1));
        Self {
            bucket: Mutex::new(Bucket {
                tokens: capacity,
                last_update: Instant::now(),
            }),
            capacity,
            refill_rate: tokens_per_second,
        }
    }

    fn reserve(&self) -> Duration {
        let mut bucket = match self.bucket.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        bucket.refill(self.capacity, self.refill_rate);
        bucket.tokens -= 1.0;
        if bucket.tokens >= 0.0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(-bucket.tokens / self.refill_rate)
        }
    }
}

#[async_trait]
impl Pacer for TokenBucket {
    async fn pause(&self) {
        let wait = self.reserve();
        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }
}

/// Build the pacer selected by `config`.
pub fn pacer_from_config(config: &BatchConfig) -> Arc<dyn Pacer> {
    match config.pacing {
        PacingMode::Fixed => Arc::new(FixedDelay(Duration::from_millis(config.item_delay_ms))),
        PacingMode::TokenBucket => {
            Arc::new(TokenBucket::new(config.tokens_per_second, config.burst))
        }
        PacingMode::None => Arc::new(NoDelay),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_sleeps() {
        let pacer = FixedDelay(Duration::from_millis(500));
        let start = Instant::now();
        pacer.pause().await;
        pacer.pause().await;
        assert_eq!(start.elapsed(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_is_instant() {
        let start = Instant::now();
        NoDelay.pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_bucket_spaces_calls() {
        let pacer = TokenBucket::new(2.0, 1);
        let start = Instant::now();

        pacer.pause().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(500));

        pacer.pause().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[test]
    fn test_pacer_from_config() {
        let mut config = BatchConfig::default();
        config.pacing = PacingMode::None;
        let _ = pacer_from_config(&config);

        config.pacing = PacingMode::TokenBucket;
        let _ = pacer_from_config(&config);
    }
}
