//! Synthetic load estimator: connection pressure, a daily oscillation and
//! jitter, plus whatever the simulation endpoint has injected.

use std::f64::consts::TAU;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Timelike, Utc};

use floodgate_core::domain::SystemLoadSnapshot;
use floodgate_core::ports::{LoadError, LoadEstimator, RandomSource};

use super::SharedLoadState;

/// Connections that would saturate the connection-pressure term.
const CONNECTIONS_AT_FULL_LOAD: f64 = 1000.0;
/// Ceiling on the connection-pressure contribution.
const MAX_CONNECTION_PRESSURE: f64 = 0.7;
/// Amplitude of the time-of-day wave.
const DAILY_AMPLITUDE: f64 = 0.1;
/// Jitter is uniform in `[-JITTER_SPAN / 2, JITTER_SPAN / 2]`.
const JITTER_SPAN: f64 = 0.1;
const SECONDS_PER_DAY: f64 = 86_400.0;

pub struct SyntheticLoadEstimator {
    state: Arc<SharedLoadState>,
    random: Arc<dyn RandomSource>,
    overload_threshold: f64,
    smoothing: f64,
}

impl SyntheticLoadEstimator {
    pub fn new(
        state: Arc<SharedLoadState>,
        random: Arc<dyn RandomSource>,
        overload_threshold: f64,
        smoothing: f64,
    ) -> Self {
        Self {
            state,
            random,
            overload_threshold,
            smoothing: smoothing.clamp(0.0, 1.0),
        }
    }

    pub fn estimate_at(&self, now: DateTime<Utc>) -> Result<SystemLoadSnapshot, LoadError> {
        let active = self.state.active_connections();

        let pressure = (active as f64 / CONNECTIONS_AT_FULL_LOAD).min(MAX_CONNECTION_PRESSURE);
        let day_fraction = now.num_seconds_from_midnight() as f64 / SECONDS_PER_DAY;
        let oscillation = DAILY_AMPLITUDE * (TAU * day_fraction).sin();
        let jitter = (self.random.next_unit() - 0.5) * JITTER_SPAN;

        let raw = pressure + oscillation + jitter + self.state.simulated_load();
        if !raw.is_finite() {
            return Err(LoadError::Unavailable(format!("non-finite load reading {raw}")));
        }

        let smoothed = self.state.smooth(raw.clamp(0.0, 1.0), self.smoothing);
        Ok(SystemLoadSnapshot::new(
            smoothed,
            active,
            self.overload_threshold,
            now,
        ))
    }
}

#[async_trait]
impl LoadEstimator for SyntheticLoadEstimator {
    async fn estimate(&self) -> Result<SystemLoadSnapshot, LoadError> {
        self.estimate_at(Utc::now())
    }

    fn active_connections(&self) -> u64 {
        self.state.active_connections()
    }
}
