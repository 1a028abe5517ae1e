//! # Floodgate Infrastructure
//!
//! Concrete implementations of the ports defined in `floodgate-core`:
//! client registries, load estimation, metrics sinks, randomness and
//! session stores.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `redis` - Redis-backed rate limiting and metrics

pub mod guard;
pub mod load;
pub mod metrics;
pub mod random;
pub mod rate_limit;
pub mod session;

#[cfg(feature = "redis")]
pub mod redis;

// Re-exports - In-Memory
pub use load::{ConnectionGuard, SharedLoadState, SyntheticLoadEstimator};
pub use metrics::{InMemoryMetricsSink, LogFileSink, MetricsRecorder, RecordOutcome};
pub use random::SeededRandom;
pub use rate_limit::{OpsThrottle, SlidingWindowConfig, SlidingWindowRateLimiter};
pub use session::{FallbackSessionStore, InMemorySessionStore};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use metrics::RedisMetricsSink;
#[cfg(feature = "redis")]
pub use rate_limit::RedisRateLimiter;
#[cfg(feature = "redis")]
pub use redis::RedisConfig;
