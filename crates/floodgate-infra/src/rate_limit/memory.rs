//! In-memory per-client sliding window rate limiter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use floodgate_core::AdmissionConfig;
use floodgate_core::domain::ClientId;
use floodgate_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

/// Windows idle for this many window lengths are eligible for eviction.
const STALE_WINDOW_FACTOR: i64 = 10;

/// In-memory rate limiter configuration.
#[derive(Debug, Clone)]
pub struct SlidingWindowConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
    /// Registry size that triggers a sweep of stale windows.
    pub registry_ceiling: usize,
}

impl Default for SlidingWindowConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            registry_ceiling: 10_000,
        }
    }
}

impl From<&AdmissionConfig> for SlidingWindowConfig {
    fn from(config: &AdmissionConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: config.window,
            registry_ceiling: config.registry_ceiling,
        }
    }
}

/// Per-client request timestamps (unix millis) in arrival order.
type ClientWindow = VecDeque<i64>;

/// Sliding window limiter keyed by client id.
///
/// Each client's window lives in a sharded map; the entry lock serializes
/// concurrent requests from the same client.
/// Note: Limits are per-process, not distributed across instances.
pub struct SlidingWindowRateLimiter {
    windows: DashMap<String, ClientWindow>,
    config: SlidingWindowConfig,
    sweeping: AtomicBool,
    /// Unix millis of the last ceiling-triggered sweep.
    last_ceiling_sweep: AtomicI64,
}

impl SlidingWindowRateLimiter {
    pub fn new(config: SlidingWindowConfig) -> Self {
        Self {
            windows: DashMap::new(),
            config,
            sweeping: AtomicBool::new(false),
            last_ceiling_sweep: AtomicI64::new(i64::MIN),
        }
    }

    pub fn config(&self) -> &SlidingWindowConfig {
        &self.config
    }

    /// Number of tracked clients.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn window_ms(&self) -> i64 {
        i64::try_from(self.config.window.as_millis()).unwrap_or(i64::MAX)
    }

    /// Synchronous core of [`RateLimiter::check_and_record`].
    pub fn check_at(&self, client_id: &str, now: DateTime<Utc>) -> RateLimitResult {
        if let Err(e) = ClientId::validate(client_id) {
            tracing::warn!(error = %e, "Malformed client id, failing open");
            return RateLimitResult::fail_open(self.config.max_requests, self.config.window);
        }

        let now_ms = now.timestamp_millis();
        let window_ms = self.window_ms();
        let cutoff = now_ms.saturating_sub(window_ms);
        let limit = self.config.max_requests;

        let result = {
            let mut window = self.windows.entry(client_id.to_string()).or_default();
            window.retain(|ts| *ts > cutoff);

            let allowed = window.len() < limit as usize;
            if allowed {
                window.push_back(now_ms);
            }

            let oldest = window.iter().min().copied().unwrap_or(now_ms);
            let reset_ms = (oldest.saturating_add(window_ms) - now_ms).clamp(0, window_ms);

            RateLimitResult {
                allowed,
                limit,
                remaining: limit.saturating_sub(window.len() as u32),
                reset_after: Duration::from_millis(reset_ms as u64),
            }
        };

        if self.windows.len() > self.config.registry_ceiling
            && self.ceiling_sweep_due(now_ms, window_ms)
        {
            let removed = self.sweep_at(now);
            tracing::debug!(
                removed,
                tracked = self.windows.len(),
                "Registry above ceiling, swept stale windows"
            );
        }

        result
    }

    /// At most one ceiling sweep per window length; the caller that wins the
    /// exchange runs it.
    fn ceiling_sweep_due(&self, now_ms: i64, window_ms: i64) -> bool {
        let last = self.last_ceiling_sweep.load(Ordering::Acquire);
        now_ms.saturating_sub(last) >= window_ms
            && self
                .last_ceiling_sweep
                .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
    }

    /// Remove windows that are empty or whose newest request is older than
    /// ten window lengths. Concurrent callers skip instead of queueing.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        if self
            .sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return 0;
        }

        let stale_before = now
            .timestamp_millis()
            .saturating_sub(self.window_ms().saturating_mul(STALE_WINDOW_FACTOR));
        let before = self.windows.len();
        self.windows
            .retain(|_, window| window.iter().any(|ts| *ts > stale_before));
        let removed = before.saturating_sub(self.windows.len());

        self.sweeping.store(false, Ordering::Release);
        removed
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowRateLimiter {
    async fn check_and_record(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, RateLimitError> {
        Ok(self.check_at(client_id, now))
    }

    async fn sweep(&self, now: DateTime<Utc>) -> usize {
        self.sweep_at(now)
    }
}
