//! Redis rate limiter: the same sliding window kept in a sorted set per
//! client, so every instance and restart sees one shared history.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::Script;
use redis::aio::ConnectionManager;

use floodgate_core::domain::ClientId;
use floodgate_core::ports::{RateLimitError, RateLimitResult, RateLimiter};

use super::SlidingWindowConfig;
use crate::redis::RedisConfig;

/// Purge, count, conditionally add, and refresh the key TTL atomically.
/// Returns `{allowed, count, reset_ms}`.
const SLIDING_WINDOW_SCRIPT: &str = r#"
local key = KEYS[1]
local now = tonumber(ARGV[1])
local window = tonumber(ARGV[2])
local limit = tonumber(ARGV[3])
local member = ARGV[4]

redis.call('ZREMRANGEBYSCORE', key, '-inf', now - window)
local count = redis.call('ZCARD', key)
local allowed = 0
if count < limit then
    redis.call('ZADD', key, now, member)
    count = count + 1
    allowed = 1
end
redis.call('PEXPIRE', key, window)

local reset = window
local oldest = redis.call('ZRANGE', key, 0, 0, 'WITHSCORES')
if oldest[2] then
    reset = tonumber(oldest[2]) + window - now
end
return {allowed, count, reset}
"#;

/// Redis-backed sliding window limiter.
pub struct RedisRateLimiter {
    conn: ConnectionManager,
    redis: RedisConfig,
    config: SlidingWindowConfig,
    script: Script,
}

impl RedisRateLimiter {
    pub async fn new(
        redis: RedisConfig,
        config: SlidingWindowConfig,
    ) -> Result<Self, RateLimitError> {
        let conn = redis.connect().await.map_err(RateLimitError::Backend)?;

        Ok(Self {
            conn,
            redis,
            config,
            script: Script::new(SLIDING_WINDOW_SCRIPT),
        })
    }
}

#[async_trait]
impl RateLimiter for RedisRateLimiter {
    async fn check_and_record(
        &self,
        client_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RateLimitResult, RateLimitError> {
        if let Err(e) = ClientId::validate(client_id) {
            tracing::warn!(error = %e, "Malformed client id, failing open");
            return Ok(RateLimitResult::fail_open(
                self.config.max_requests,
                self.config.window,
            ));
        }

        let now_ms = now.timestamp_millis();
        let window_ms = self.config.window.as_millis() as i64;
        let member = format!("{now_ms}-{}", uuid::Uuid::new_v4());
        let mut conn = self.conn.clone();

        let result: Vec<i64> = self
            .script
            .key(self.redis.key(&["rl", client_id]))
            .arg(now_ms)
            .arg(window_ms)
            .arg(self.config.max_requests)
            .arg(member)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| RateLimitError::Backend(e.to_string()))?;

        let allowed = result.first().copied().unwrap_or(1) == 1;
        let count = result.get(1).copied().unwrap_or(0).max(0) as u32;
        let reset_ms = result.get(2).copied().unwrap_or(window_ms).clamp(0, window_ms);

        Ok(RateLimitResult {
            allowed,
            limit: self.config.max_requests,
            remaining: self.config.max_requests.saturating_sub(count),
            reset_after: Duration::from_millis(reset_ms as u64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get_test_ratelimiter(max_requests: u32) -> Option<RedisRateLimiter> {
        let redis = RedisConfig {
            url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6389".to_string()),
            connect_timeout: Duration::from_secs(1),
            key_prefix: format!("test_floodgate_{}", uuid::Uuid::new_v4()),
        };
        let config = SlidingWindowConfig {
            max_requests,
            window: Duration::from_secs(1),
            registry_ceiling: 10_000,
        };

        RedisRateLimiter::new(redis, config).await.ok()
    }

    #[tokio::test]
    async fn test_redis_sliding_window() {
        let limiter = match get_test_ratelimiter(2).await {
            Some(l) => l,
            None => return,
        };
        let start = Utc::now();
        let key = "10.0.0.1:test";

        let res = limiter.check_and_record(key, start).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 1);

        let res = limiter.check_and_record(key, start).await.unwrap();
        assert!(res.allowed);
        assert_eq!(res.remaining, 0);

        let res = limiter.check_and_record(key, start).await.unwrap();
        assert!(!res.allowed);

        // One full window later the history has rolled off.
        let later = start + chrono::Duration::milliseconds(1_000);
        let res = limiter.check_and_record(key, later).await.unwrap();
        assert!(res.allowed);
    }

    #[tokio::test]
    async fn test_redis_fails_open_on_empty_id() {
        let limiter = match get_test_ratelimiter(1).await {
            Some(l) => l,
            None => return,
        };
        for _ in 0..3 {
            assert!(limiter.check_and_record("", Utc::now()).await.unwrap().allowed);
        }
    }
}
