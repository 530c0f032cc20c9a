//! Outgoing request pacing
//!
//! One direct rate limiter per source run keeps request bursts inside the
//! per-minute budget; the coarse inter-page and inter-dimension delays are
//! explicit sleeps on top of this floor.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;

/// Request pacer enforcing a per-minute budget
pub struct Pacer {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl Pacer {
    /// Pacer allowing `requests` per minute (minimum 1)
    pub fn per_minute(requests: u32) -> Self {
        // Safe: max(1) guarantees non-zero
        let quota = Quota::per_minute(NonZeroU32::new(requests.max(1)).unwrap());
        Self {
            limiter: RateLimiter::direct(quota),
        }
    }

    /// Wait until the next request fits the budget
    pub async fn until_ready(&self) {
        self.limiter.until_ready().await;
    }
}
