//! Per-dependency timeout and logging policy.
//!
//! Every call the orchestrator makes into a fallible dependency goes through
//! one entry of this table instead of a hand-written timeout at the call site.

use std::time::Duration;

/// Dependencies consulted while admitting a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependency {
    LoadEstimator,
    RateLimiter,
    MetricsSink,
}

impl Dependency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dependency::LoadEstimator => "load_estimator",
            Dependency::RateLimiter => "rate_limiter",
            Dependency::MetricsSink => "metrics_sink",
        }
    }
}

/// Log level used when a dependency falls back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Debug,
    Warn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyPolicy {
    pub timeout: Duration,
    pub severity: Severity,
}

impl DependencyPolicy {
    pub const fn new(timeout: Duration, severity: Severity) -> Self {
        Self { timeout, severity }
    }
}

#[derive(Debug, Clone)]
pub struct PolicyTable {
    load_estimator: DependencyPolicy,
    rate_limiter: DependencyPolicy,
    metrics_sink: DependencyPolicy,
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self {
            load_estimator: DependencyPolicy::new(Duration::from_secs(3), Severity::Warn),
            rate_limiter: DependencyPolicy::new(Duration::from_secs(1), Severity::Warn),
            metrics_sink: DependencyPolicy::new(Duration::from_secs(2), Severity::Warn),
        }
    }
}

impl PolicyTable {
    pub fn get(&self, dependency: Dependency) -> DependencyPolicy {
        match dependency {
            Dependency::LoadEstimator => self.load_estimator,
            Dependency::RateLimiter => self.rate_limiter,
            Dependency::MetricsSink => self.metrics_sink,
        }
    }

    pub fn with(mut self, dependency: Dependency, policy: DependencyPolicy) -> Self {
        match dependency {
            Dependency::LoadEstimator => self.load_estimator = policy,
            Dependency::RateLimiter => self.rate_limiter = policy,
            Dependency::MetricsSink => self.metrics_sink = policy,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let table = PolicyTable::default();
        assert_eq!(
            table.get(Dependency::LoadEstimator).timeout,
            Duration::from_secs(3)
        );
        assert_eq!(
            table.get(Dependency::MetricsSink).timeout,
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_override_single_entry() {
        let fast = DependencyPolicy::new(Duration::from_millis(50), Severity::Debug);
        let table = PolicyTable::default().with(Dependency::MetricsSink, fast);

        assert_eq!(table.get(Dependency::MetricsSink), fast);
        assert_eq!(table.get(Dependency::RateLimiter).severity, Severity::Warn);
    }
}
