//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod load;
mod metrics;
mod random;
mod rate_limit;
mod session;

pub use load::{LoadError, LoadEstimator};
pub use metrics::{MetricsError, MetricsSink};
pub use random::RandomSource;
pub use rate_limit::{RateLimitError, RateLimitResult, RateLimiter};
pub use session::{SessionError, SessionStore};
