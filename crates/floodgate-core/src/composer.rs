//! Builds the 503 rejection handed back to shed or throttled callers.

use chrono::{DateTime, Utc};
use std::time::Duration;

use floodgate_shared::{ErrorCode, ErrorResponse};

use crate::domain::DecisionReason;

pub const OVERLOAD_RETRY_AFTER_SECS: u64 = 30;
pub const MAINTENANCE_RETRY_AFTER_SECS: u64 = 300;

pub const RETRY_AFTER: &str = "Retry-After";
pub const RATE_LIMIT_LIMIT: &str = "X-RateLimit-Limit";
pub const RATE_LIMIT_REMAINING: &str = "X-RateLimit-Remaining";
pub const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";

/// Framework-neutral rejection: status, headers and JSON body.
#[derive(Debug, Clone)]
pub struct Rejection {
    pub status: u16,
    pub retry_after_secs: u64,
    pub headers: Vec<(&'static str, String)>,
    pub body: ErrorResponse,
}

impl Rejection {
    /// Generic 503 used when a proper rejection cannot be built.
    pub fn minimal(request_id: &str) -> Self {
        Self {
            status: 503,
            retry_after_secs: OVERLOAD_RETRY_AFTER_SECS,
            headers: vec![(RETRY_AFTER, OVERLOAD_RETRY_AFTER_SECS.to_string())],
            body: ErrorResponse::service_unavailable(
                ErrorCode::SysOverload,
                "Service temporarily unavailable",
            )
            .with_request_id(request_id)
            .with_retry_after(OVERLOAD_RETRY_AFTER_SECS),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Composes rejections for a fixed quota and window.
#[derive(Debug, Clone)]
pub struct ResponseComposer {
    limit: u32,
    window: Duration,
}

impl ResponseComposer {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window }
    }

    pub fn build_rejection(&self, reason: DecisionReason, request_id: &str) -> Rejection {
        self.build_rejection_at(reason, request_id, Utc::now())
    }

    pub fn build_rejection_at(
        &self,
        reason: DecisionReason,
        request_id: &str,
        now: DateTime<Utc>,
    ) -> Rejection {
        let (code, retry_after, detail) = match reason {
            DecisionReason::SystemOverload => (
                ErrorCode::SysOverload,
                OVERLOAD_RETRY_AFTER_SECS,
                "System is overloaded, request shed".to_string(),
            ),
            DecisionReason::RateLimited => (
                ErrorCode::RateLimit,
                self.window.as_secs().max(1),
                format!(
                    "Rate limit of {} requests per {} seconds exceeded",
                    self.limit,
                    self.window.as_secs()
                ),
            ),
            DecisionReason::Maintenance => (
                ErrorCode::Maintenance,
                MAINTENANCE_RETRY_AFTER_SECS,
                "Service is under maintenance".to_string(),
            ),
            DecisionReason::Ok => return Rejection::minimal(request_id),
        };

        let reset_at = now.timestamp().saturating_add(retry_after as i64);

        Rejection {
            status: 503,
            retry_after_secs: retry_after,
            headers: vec![
                (RETRY_AFTER, retry_after.to_string()),
                (RATE_LIMIT_LIMIT, self.limit.to_string()),
                (RATE_LIMIT_REMAINING, "0".to_string()),
                (RATE_LIMIT_RESET, reset_at.to_string()),
            ],
            body: ErrorResponse::service_unavailable(code, detail)
                .with_request_id(request_id)
                .with_retry_after(retry_after),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn composer() -> ResponseComposer {
        ResponseComposer::new(100, Duration::from_secs(60))
    }

    #[test]
    fn test_rate_limited_retries_after_window() {
        let now = Utc::now();
        let rejection = composer().build_rejection_at(DecisionReason::RateLimited, "req-9", now);

        assert_eq!(rejection.status, 503);
        assert_eq!(rejection.body.code, ErrorCode::RateLimit);
        assert_eq!(rejection.header("Retry-After"), Some("60"));
        assert_eq!(rejection.header("x-ratelimit-limit"), Some("100"));
        assert_eq!(rejection.header(RATE_LIMIT_REMAINING), Some("0"));
        assert_eq!(
            rejection.header(RATE_LIMIT_RESET),
            Some((now.timestamp() + 60).to_string().as_str())
        );
        assert_eq!(rejection.body.request_id.as_deref(), Some("req-9"));
    }

    #[test]
    fn test_overload_and_maintenance_hints() {
        let overload = composer().build_rejection(DecisionReason::SystemOverload, "r");
        assert_eq!(overload.body.code, ErrorCode::SysOverload);
        assert_eq!(overload.retry_after_secs, 30);

        let maintenance = composer().build_rejection(DecisionReason::Maintenance, "r");
        assert_eq!(maintenance.body.code, ErrorCode::Maintenance);
        assert_eq!(maintenance.header(RETRY_AFTER), Some("300"));
    }

    #[test]
    fn test_ok_reason_degrades_to_generic_503() {
        let rejection = composer().build_rejection(DecisionReason::Ok, "r");
        assert_eq!(rejection.status, 503);
        assert_eq!(rejection.header(RETRY_AFTER), Some("30"));
    }
}
