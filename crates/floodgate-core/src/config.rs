//! Admission limits and thresholds.

use std::time::Duration;

/// Tunables shared by the rate limiter, load estimator and admission controller.
#[derive(Debug, Clone)]
pub struct AdmissionConfig {
    /// Maximum accepted requests per client per window.
    pub max_requests: u32,
    /// Rate-limit window length.
    pub window: Duration,
    /// Registry size above which stale client windows are swept.
    pub registry_ceiling: usize,
    /// `cpuLoad` strictly above this marks the system overloaded.
    pub overload_threshold: f64,
    /// During overload, draws above this value are shed.
    pub allowance_threshold: f64,
    /// Weight of the newest raw reading in the smoothed load (1.0 = no smoothing).
    pub load_smoothing: f64,
    /// Upper bound on one request's trip through the orchestrator.
    pub request_timeout: Duration,
    /// Reject every normal-mode request with a maintenance response.
    pub maintenance_mode: bool,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            registry_ceiling: 10_000,
            overload_threshold: 0.8,
            allowance_threshold: 0.9,
            load_smoothing: 1.0,
            request_timeout: Duration::from_secs(10),
            maintenance_mode: false,
        }
    }
}

impl AdmissionConfig {
    /// Build from a key lookup (usually `std::env::var`). Missing or unparsable
    /// values fall back to defaults; out-of-range values are clamped.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |key: &str| lookup(key).and_then(|s| s.trim().parse::<f64>().ok());
        let flag = |key: &str| {
            lookup(key)
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false)
        };

        Self {
            max_requests: lookup("RATE_LIMIT_MAX_REQUESTS")
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(defaults.max_requests)
                .max(1),
            window: Duration::from_secs(
                lookup("RATE_LIMIT_WINDOW_SECS")
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(defaults.window.as_secs())
                    .max(1),
            ),
            registry_ceiling: lookup("RATE_LIMIT_REGISTRY_CEILING")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.registry_ceiling),
            overload_threshold: unit(parse("OVERLOAD_THRESHOLD"), defaults.overload_threshold),
            allowance_threshold: unit(parse("ALLOWANCE_THRESHOLD"), defaults.allowance_threshold),
            load_smoothing: unit(parse("LOAD_SMOOTHING"), defaults.load_smoothing),
            request_timeout: Duration::from_secs(
                lookup("REQUEST_TIMEOUT_SECS")
                    .and_then(|s| s.trim().parse::<u64>().ok())
                    .unwrap_or(defaults.request_timeout.as_secs())
                    .max(1),
            ),
            maintenance_mode: flag("MAINTENANCE_MODE"),
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

fn unit(value: Option<f64>, default: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(0.0, 1.0),
        _ => default,
    }
}
