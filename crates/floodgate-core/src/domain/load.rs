use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use floodgate_shared::dto::SystemLoadView;

/// `memoryUsage` is reported as this fraction of `cpuLoad`.
pub const MEMORY_LOAD_FACTOR: f64 = 0.8;

/// Load reported when the estimator is unavailable.
const SAFE_DEFAULT_LOAD: f64 = 0.5;

/// Point-in-time read of system health, recomputed on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemLoadSnapshot {
    pub cpu_load: f64,
    pub memory_usage: f64,
    pub active_connections: u64,
    pub is_overloaded: bool,
    pub timestamp: DateTime<Utc>,
}

impl SystemLoadSnapshot {
    /// Build a snapshot, clamping the load into `[0, 1]`.
    pub fn new(
        cpu_load: f64,
        active_connections: u64,
        overload_threshold: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let cpu_load = if cpu_load.is_finite() {
            cpu_load.clamp(0.0, 1.0)
        } else {
            SAFE_DEFAULT_LOAD
        };

        Self {
            cpu_load,
            memory_usage: (cpu_load * MEMORY_LOAD_FACTOR).clamp(0.0, 1.0),
            active_connections,
            is_overloaded: cpu_load > overload_threshold,
            timestamp,
        }
    }

    /// Neutral reading used when estimation fails; never marks overload.
    pub fn safe_default(active_connections: u64) -> Self {
        Self {
            cpu_load: SAFE_DEFAULT_LOAD,
            memory_usage: SAFE_DEFAULT_LOAD * MEMORY_LOAD_FACTOR,
            active_connections,
            is_overloaded: false,
            timestamp: Utc::now(),
        }
    }

    pub fn to_view(&self) -> SystemLoadView {
        SystemLoadView {
            cpu_load: self.cpu_load,
            memory_usage: self.memory_usage,
            active_connections: self.active_connections,
            is_overloaded: self.is_overloaded,
            timestamp: self.timestamp,
        }
    }
}
