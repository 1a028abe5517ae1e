//! Global throttle for operational endpoints, using the governor crate.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultDirectRateLimiter, Quota};

/// Process-wide GCRA limiter guarding endpoints that mutate shared state.
pub struct OpsThrottle {
    limiter: DefaultDirectRateLimiter,
    clock: DefaultClock,
}

impl OpsThrottle {
    /// Allow `per_second` calls per second with an equal burst. Zero is
    /// treated as one.
    pub fn new(per_second: u32) -> Self {
        let rate = NonZeroU32::new(per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: DefaultDirectRateLimiter::direct(Quota::per_second(rate)),
            clock: DefaultClock::default(),
        }
    }

    /// `Ok(())` when the call may proceed, otherwise how long to wait.
    pub fn check(&self) -> Result<(), Duration> {
        self.limiter
            .check()
            .map_err(|not_until| not_until.wait_time_from(self.clock.now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_throttled() {
        let throttle = OpsThrottle::new(3);
        for _ in 0..3 {
            assert!(throttle.check().is_ok());
        }
        let wait = throttle.check().unwrap_err();
        assert!(wait <= Duration::from_secs(1));
    }

    #[test]
    fn test_zero_rate_still_allows_one() {
        let throttle = OpsThrottle::new(0);
        assert!(throttle.check().is_ok());
        assert!(throttle.check().is_err());
    }
}
