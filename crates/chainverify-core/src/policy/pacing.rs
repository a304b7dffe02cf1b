//! The [`Throttle`] capability and its simple implementations.

use async_trait::async_trait;
use std::time::Duration;

use crate::types::ExplorerFamily;

/// Delay applied before each explorer request when nothing else is configured.
pub const DEFAULT_EXPLORER_DELAY: Duration = Duration::from_millis(6_000);

/// Waits until the next explorer request may be issued.
///
/// Implementations must be `Send + Sync` so one throttle can be shared by
/// every client talking to the same explorer.
#[async_trait]
pub trait Throttle: Send + Sync + 'static {
    async fn acquire(&self);
}

/// Sleeps for a fixed duration before every request.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    pub delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self::new(DEFAULT_EXPLORER_DELAY)
    }
}

#[async_trait]
impl Throttle for FixedDelay {
    async fn acquire(&self) {
        tracing::trace!(delay_ms = self.delay.as_millis() as u64, "pacing explorer request");
        tokio::time::sleep(self.delay).await;
    }
}

/// No pacing at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unthrottled;

#[async_trait]
impl Throttle for Unthrottled {
    async fn acquire(&self) {}
}

/// How long a submitter should wait after deploying before submitting
/// verification to an explorer of this family.
pub fn verification_delay(family: ExplorerFamily) -> Option<Duration> {
    match family {
        ExplorerFamily::Etherscan => Some(Duration::from_millis(40_000)),
        _ => None,
    }
}
