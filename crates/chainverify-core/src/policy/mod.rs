//! Request pacing for explorer APIs.
//!
//! Explorer APIs rate-limit aggressively, so every explorer request first
//! passes through a [`Throttle`]:
//! ```text
//! ExplorerClient → [Throttle::acquire] → HTTP
//! ```

pub mod pacing;
pub mod rate_limiter;

pub use pacing::{verification_delay, FixedDelay, Throttle, Unthrottled, DEFAULT_EXPLORER_DELAY};
pub use rate_limiter::{RateLimiter, RateLimiterConfig, TokenBucket};
