//! Pacing for outbound collaborator calls.
//!
//! Combines a governor minimum-interval gate (shared by every clone) with a
//! randomized delay so requests never leave in bursts.

use std::sync::Arc;
use std::time::Duration;

use governor::{Quota, RateLimiter};

use crate::config::ThrottleConfig;

type DefaultRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Shared gate plus jitter.
#[derive(Clone)]
pub struct Throttle {
    limiter: Option<Arc<DefaultRateLimiter>>,
    jitter: (Duration, Duration),
}

impl Throttle {
    pub fn new(config: &ThrottleConfig) -> Self {
        let limiter = Quota::with_period(config.min_interval)
            .map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self {
            limiter,
            jitter: config.jitter,
        }
    }

    /// A throttle that never waits.
    pub fn disabled() -> Self {
        Self::new(&ThrottleConfig::none())
    }

    /// Wait for the gate, then for a random delay within the jitter range.
    pub async fn wait(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
        let delay = random_between(self.jitter);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle")
            .field("gated", &self.limiter.is_some())
            .field("jitter", &self.jitter)
            .finish()
    }
}

/// Uniform random duration in `[low, high]` at millisecond resolution.
pub fn random_between((low, high): (Duration, Duration)) -> Duration {
    let low_ms = low.as_millis() as u64;
    let high_ms = high.as_millis() as u64;
    if high_ms <= low_ms {
        return low;
    }
    Duration::from_millis(fastrand::u64(low_ms..=high_ms))
}
