//! Shared outbound request throttling.

use std::num::NonZeroU32;

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota};

/// Caps the outbound fetch rate across all workers.
///
/// `acquire` waits until a request slot is available and never fails.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn acquire(&self);
}

/// Token bucket limiter backed by `governor`.
pub struct GovernorLimiter {
    inner: DefaultDirectRateLimiter,
}

impl GovernorLimiter {
    /// Allow `requests` per second; zero is treated as one.
    pub fn per_second(requests: u32) -> Self {
        let rate = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: governor::RateLimiter::direct(Quota::per_second(rate)),
        }
    }
}

#[async_trait]
impl RateLimiter for GovernorLimiter {
    async fn acquire(&self) {
        self.inner.until_ready().await;
    }
}
