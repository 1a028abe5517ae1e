//! Cron-style maintenance jobs using tokio-cron-scheduler.

use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use floodgate_core::ports::RateLimiter;

/// Every minute, on the minute.
pub const REGISTRY_SWEEP_SCHEDULE: &str = "0 * * * * *";

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub enabled: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("SCHEDULER_ENABLED")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }
}

/// Cron job scheduler wrapper.
pub struct Scheduler {
    inner: JobScheduler,
    config: SchedulerConfig,
}

impl Scheduler {
    pub async fn new(config: SchedulerConfig) -> Result<Self, JobSchedulerError> {
        let inner = JobScheduler::new().await?;
        Ok(Self { inner, config })
    }

    pub async fn add_cron<F, Fut>(
        &self,
        schedule: &str,
        task: F,
    ) -> Result<uuid::Uuid, JobSchedulerError>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            Box::pin(async move {
                task().await;
            })
        })?;

        let id = self.inner.add(job).await?;
        tracing::info!(schedule = %schedule, job_id = %id, "Cron job registered");
        Ok(id)
    }

    /// Drop stale client windows every minute so idle clients do not pin
    /// memory between ceiling-triggered sweeps.
    pub async fn add_registry_sweep(
        &self,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Result<uuid::Uuid, JobSchedulerError> {
        self.add_cron(REGISTRY_SWEEP_SCHEDULE, move || {
            let rate_limiter = Arc::clone(&rate_limiter);
            async move {
                let removed = rate_limiter.sweep(Utc::now()).await;
                if removed > 0 {
                    tracing::info!(removed, "Swept stale client windows");
                } else {
                    tracing::debug!("Registry sweep found nothing to remove");
                }
            }
        })
        .await
    }

    pub async fn start(&self) -> Result<(), JobSchedulerError> {
        if !self.config.enabled {
            tracing::info!("Scheduler disabled");
            return Ok(());
        }

        self.inner.start().await?;
        tracing::info!("Scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), JobSchedulerError> {
        self.inner.shutdown().await?;
        tracing::info!("Scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registers_sweep_job() {
        let scheduler = Scheduler::new(SchedulerConfig { enabled: false })
            .await
            .unwrap();
        let limiter = Arc::new(floodgate_infra::SlidingWindowRateLimiter::new(
            floodgate_infra::SlidingWindowConfig::default(),
        ));

        assert!(scheduler.add_registry_sweep(limiter).await.is_ok());
        assert!(scheduler.start().await.is_ok());
    }
}
