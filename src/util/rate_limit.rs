//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified events per second
pub fn create_limiter(per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Failure warnings emitted per second for one call site
pub const FAILURE_LOG_RATE_LIMIT: u32 = 1;

/// Throttles repeated warnings from a single failing call site.
/// Suppressed events are counted so the next emitted warning can report them.
#[derive(Clone)]
pub struct LogThrottle {
    limiter: Arc<Limiter>,
    suppressed: Arc<AtomicU64>,
}

impl LogThrottle {
    pub fn new(per_second: u32) -> Self {
        Self {
            limiter: create_limiter(per_second),
            suppressed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Returns `Some(suppressed_since_last)` when the caller may log now
    pub fn check(&self) -> Option<u64> {
        if self.limiter.check().is_ok() {
            Some(self.suppressed.swap(0, Ordering::Relaxed))
        } else {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            None
        }
    }
}

impl Default for LogThrottle {
    fn default() -> Self {
        Self::new(FAILURE_LOG_RATE_LIMIT)
    }
}
