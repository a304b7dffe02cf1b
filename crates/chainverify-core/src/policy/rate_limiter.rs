//! Token bucket pacing.
//!
//! Tokens accrue at `refill_rate` per second up to `capacity`; each explorer
//! request spends one. When the bucket is empty, [`RateLimiter::acquire`]
//! sleeps until a token is available instead of failing.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::pacing::Throttle;
use crate::error::VerifyError;

/// Tokens spent per request unless overridden.
pub const DEFAULT_REQUEST_COST: f64 = 1.0;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum burst size.
    pub capacity: f64,
    /// Tokens added per second.
    pub refill_rate: f64,
}

impl RateLimiterConfig {
    /// `n` requests per second with no burst beyond one second's worth.
    pub fn per_second(n: f64) -> Self {
        Self {
            capacity: n,
            refill_rate: n,
        }
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        // Free-tier explorer keys allow 5 calls/s.
        Self::per_second(5.0)
    }
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Thread-safe token bucket, driven by the tokio clock.
pub struct TokenBucket {
    config: RateLimiterConfig,
    state: Mutex<BucketState>,
}

impl TokenBucket {
    /// Reject buckets that could never hand out `cost` tokens.
    ///
    /// `capacity` must cover one request and `refill_rate` must be positive and
    /// finite, otherwise a waiting caller would sleep forever.
    pub fn try_new(config: RateLimiterConfig, cost: f64) -> Result<Self, VerifyError> {
        let RateLimiterConfig {
            capacity,
            refill_rate,
        } = config;
        if !(cost > 0.0 && cost.is_finite()) {
            return Err(VerifyError::Config(format!(
                "token bucket request cost must be positive, got {cost}"
            )));
        }
        if !(capacity >= cost && capacity.is_finite()) {
            return Err(VerifyError::Config(format!(
                "token bucket capacity {capacity} cannot cover a request costing {cost}"
            )));
        }
        if !(refill_rate > 0.0 && refill_rate.is_finite()) {
            return Err(VerifyError::Config(format!(
                "token bucket refill rate must be positive, got {refill_rate}"
            )));
        }
        Ok(Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            config,
        })
    }

    /// Take `cost` tokens if available.
    pub fn try_acquire(&self, cost: f64) -> bool {
        let mut state = self.lock();
        self.refill(&mut state);
        if state.tokens >= cost {
            state.tokens -= cost;
            true
        } else {
            false
        }
    }

    /// Estimated time until `cost` tokens are available.
    pub fn wait_time(&self, cost: f64) -> Duration {
        let mut state = self.lock();
        self.refill(&mut state);
        let deficit = cost - state.tokens;
        if deficit <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(deficit / self.config.refill_rate).unwrap_or(Duration::MAX)
        }
    }

    pub fn available(&self) -> f64 {
        let mut state = self.lock();
        self.refill(&mut state);
        state.tokens
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BucketState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.config.refill_rate).min(self.config.capacity);
        state.last_refill = now;
    }
}

/// [`Throttle`] backed by a [`TokenBucket`].
pub struct RateLimiter {
    bucket: TokenBucket,
    cost: f64,
}

impl RateLimiter {
    /// One token per request.
    pub fn try_new(config: RateLimiterConfig) -> Result<Self, VerifyError> {
        Self::with_cost(config, DEFAULT_REQUEST_COST)
    }

    pub fn with_cost(config: RateLimiterConfig, cost: f64) -> Result<Self, VerifyError> {
        Ok(Self {
            bucket: TokenBucket::try_new(config, cost)?,
            cost,
        })
    }

    /// Tokens spent per request.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    pub fn try_acquire(&self) -> bool {
        self.bucket.try_acquire(self.cost)
    }
}

#[async_trait]
impl Throttle for RateLimiter {
    async fn acquire(&self) {
        loop {
            if self.bucket.try_acquire(self.cost) {
                return;
            }
            let wait = self.bucket.wait_time(self.cost).max(Duration::from_millis(1));
            tracing::debug!(wait_ms = wait.as_millis() as u64, "explorer rate limit reached, waiting");
            tokio::time::sleep(wait).await;
        }
    }
}
