//! Rate limiting port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Rate limiter trait - abstraction over per-client window backends.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Check the client's window at `now` and record the request if accepted.
    ///
    /// A malformed `client_id` is allowed (fail open) and leaves no trace.
    async fn check_and_record(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, RateLimitError>;

    /// Drop stale client windows. Returns how many were removed.
    ///
    /// Backends with native key expiry have nothing to do.
    async fn sweep(&self, _now: DateTime<Utc>) -> usize {
        0
    }
}

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    pub reset_after: Duration,
}

impl RateLimitResult {
    /// Result used when the limiter cannot or should not decide.
    pub fn fail_open(limit: u32, window: Duration) -> Self {
        Self {
            allowed: true,
            limit,
            remaining: limit,
            reset_after: window,
        }
    }
}

/// Rate limit errors.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitError {
    #[error("Backend error: {0}")]
    Backend(String),
}
