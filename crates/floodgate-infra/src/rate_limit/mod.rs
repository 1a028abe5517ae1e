//! Rate limiting implementations.

mod memory;
mod ops;

pub use memory::{SlidingWindowConfig, SlidingWindowRateLimiter};
pub use ops::OpsThrottle;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisRateLimiter;
