//! Application state - shared across all handlers.

use std::sync::Arc;

use floodgate_core::ports::{MetricsSink, RandomSource, RateLimiter};
use floodgate_core::{Dependency, PolicyTable};
use floodgate_infra::{
    InMemoryMetricsSink, LogFileSink, MetricsRecorder, OpsThrottle, SeededRandom,
    SharedLoadState, SlidingWindowConfig, SlidingWindowRateLimiter, SyntheticLoadEstimator,
};

#[cfg(feature = "redis")]
use floodgate_infra::{RedisConfig, RedisMetricsSink, RedisRateLimiter};

use crate::config::AppConfig;
use crate::orchestrator::{Collaborators, RequestOrchestrator};

/// Shared application state. Every handle is built once at startup; tests
/// build isolated instances.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub load_state: Arc<SharedLoadState>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub orchestrator: Arc<RequestOrchestrator>,
    pub ops_throttle: Arc<OpsThrottle>,
}

impl AppState {
    /// Build the state with Redis-backed windows and metrics when
    /// `REDIS_URL` is set and reachable, in-memory otherwise.
    pub async fn new(config: AppConfig) -> Self {
        let random: Arc<dyn RandomSource> = Arc::new(SeededRandom::from_env());

        #[cfg(feature = "redis")]
        let shared = match RedisConfig::from_env() {
            Some(redis) => match Self::connect_redis(&config, redis).await {
                Ok(backends) => {
                    tracing::info!("Using Redis for client windows and decision records");
                    Some(backends)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to Redis: {}. Using in-memory fallback.",
                        e
                    );
                    None
                }
            },
            None => {
                tracing::info!("REDIS_URL not set. Running with in-memory state.");
                None
            }
        };

        #[cfg(not(feature = "redis"))]
        let shared: Option<(Arc<dyn RateLimiter>, Arc<dyn MetricsSink>)> = None;

        match shared {
            Some((rate_limiter, durable)) => Self::assemble(config, random, rate_limiter, durable),
            None => Self::in_memory(config, random),
        }
    }

    #[cfg(feature = "redis")]
    async fn connect_redis(
        config: &AppConfig,
        redis: RedisConfig,
    ) -> Result<(Arc<dyn RateLimiter>, Arc<dyn MetricsSink>), String> {
        let durable = RedisMetricsSink::new(&redis, config.metrics_buffer_size)
            .await
            .map_err(|e| e.to_string())?;
        let limiter = RedisRateLimiter::new(redis, SlidingWindowConfig::from(&config.admission))
            .await
            .map_err(|e| e.to_string())?;

        Ok((Arc::new(limiter), Arc::new(durable)))
    }

    /// Process-local state only.
    pub fn in_memory(config: AppConfig, random: Arc<dyn RandomSource>) -> Self {
        let rate_limiter = Arc::new(SlidingWindowRateLimiter::new(SlidingWindowConfig::from(
            &config.admission,
        )));
        let durable = Arc::new(InMemoryMetricsSink::new(config.metrics_buffer_size));

        Self::assemble(config, random, rate_limiter, durable)
    }

    fn assemble(
        config: AppConfig,
        random: Arc<dyn RandomSource>,
        rate_limiter: Arc<dyn RateLimiter>,
        durable: Arc<dyn MetricsSink>,
    ) -> Self {
        let policies = PolicyTable::default();
        let load_state = Arc::new(SharedLoadState::new());

        let estimator = Arc::new(SyntheticLoadEstimator::new(
            Arc::clone(&load_state),
            Arc::clone(&random),
            config.admission.overload_threshold,
            config.admission.load_smoothing,
        ));
        let recorder = Arc::new(MetricsRecorder::new(
            durable,
            Arc::new(LogFileSink::new(config.metrics_log_path.clone())),
            policies.get(Dependency::MetricsSink),
        ));

        let orchestrator = Arc::new(RequestOrchestrator::new(
            config.admission.clone(),
            policies,
            Collaborators {
                load_state: Arc::clone(&load_state),
                estimator,
                rate_limiter: Arc::clone(&rate_limiter),
                random,
                recorder,
            },
        ));

        tracing::info!(
            max_requests = config.admission.max_requests,
            window_secs = config.admission.window.as_secs(),
            overload_threshold = config.admission.overload_threshold,
            allowance_threshold = config.admission.allowance_threshold,
            maintenance_mode = config.admission.maintenance_mode,
            simulation_enabled = config.simulation_enabled,
            "Application state initialized"
        );

        Self {
            ops_throttle: Arc::new(OpsThrottle::new(config.simulation_per_second)),
            config: Arc::new(config),
            load_state,
            rate_limiter,
            orchestrator,
        }
    }
}
