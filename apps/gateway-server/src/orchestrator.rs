//! Request orchestrator - sequences connection accounting, load estimation,
//! rate limiting, admission and metrics for one request.
//!
//! Stages, each traced at debug level:
//! `start → connection_opened → load_estimated → rate_checked →
//! admitted|rejected → metrics_recorded → connection_closed`.
//!
//! The in-flight slot is held by a `ConnectionGuard`, so it is released
//! exactly once whether the pipeline finishes, panics, or is cancelled by
//! the overall request timeout.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::FutureExt;
use tokio::task::JoinHandle;

use floodgate_core::domain::{
    AdmissionDecision, ClientId, DecisionRecord, DecisionReason, SystemLoadSnapshot,
};
use floodgate_core::ports::{LoadError, LoadEstimator, RandomSource, RateLimitResult, RateLimiter};
use floodgate_core::{
    AdmissionConfig, AdmissionController, Dependency, PolicyTable, Rejection, ResponseComposer,
};
use floodgate_infra::guard;
use floodgate_infra::{MetricsRecorder, RecordOutcome, SharedLoadState};
use floodgate_shared::dto::{RateLimitInfo, StatusResponse};

use crate::middleware::error::AppError;

#[derive(Debug, Clone, Copy)]
enum Stage {
    Start,
    ConnectionOpened,
    LoadEstimated,
    RateChecked,
    Admitted,
    Rejected,
    MetricsRecorded,
    ConnectionClosed,
}

impl Stage {
    fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::ConnectionOpened => "connection_opened",
            Stage::LoadEstimated => "load_estimated",
            Stage::RateChecked => "rate_checked",
            Stage::Admitted => "admitted",
            Stage::Rejected => "rejected",
            Stage::MetricsRecorded => "metrics_recorded",
            Stage::ConnectionClosed => "connection_closed",
        }
    }
}

fn enter(stage: Stage, request_id: &str) {
    tracing::debug!(request_id, stage = stage.as_str(), "Admission stage");
}

/// Everything the orchestrator needs besides configuration.
pub struct Collaborators {
    pub load_state: Arc<SharedLoadState>,
    pub estimator: Arc<dyn LoadEstimator>,
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub random: Arc<dyn RandomSource>,
    pub recorder: Arc<MetricsRecorder>,
}

/// An admitted request, with what the caller is told about it.
#[derive(Debug, Clone)]
pub struct Admitted {
    pub request_id: String,
    pub processing_time_ms: u64,
    pub system_load: f64,
    pub limit: u32,
    pub remaining: u32,
}

#[derive(Debug, Clone)]
pub enum GateOutcome {
    Admitted(Admitted),
    Rejected(Rejection),
}

/// Outcome plus the handle of the detached metrics write.
#[derive(Debug)]
pub struct Gated {
    pub outcome: GateOutcome,
    pub metrics: JoinHandle<RecordOutcome>,
}

pub struct RequestOrchestrator {
    config: AdmissionConfig,
    policies: PolicyTable,
    load_state: Arc<SharedLoadState>,
    estimator: Arc<dyn LoadEstimator>,
    rate_limiter: Arc<dyn RateLimiter>,
    controller: AdmissionController,
    composer: ResponseComposer,
    recorder: Arc<MetricsRecorder>,
}

impl RequestOrchestrator {
    pub fn new(config: AdmissionConfig, policies: PolicyTable, parts: Collaborators) -> Self {
        let controller = AdmissionController::new(config.allowance_threshold, parts.random);
        let composer = ResponseComposer::new(config.max_requests, config.window);

        Self {
            config,
            policies,
            load_state: parts.load_state,
            estimator: parts.estimator,
            rate_limiter: parts.rate_limiter,
            controller,
            composer,
            recorder: parts.recorder,
        }
    }

    pub fn config(&self) -> &AdmissionConfig {
        &self.config
    }

    /// Run one normal-mode request through the gate.
    ///
    /// Shedding is an `Ok` outcome; `Err` is reserved for timeouts and
    /// internal faults.
    pub async fn process(&self, client: &ClientId, request_id: &str) -> Result<Gated, AppError> {
        let started = Instant::now();
        let pipeline = AssertUnwindSafe(self.run(client, request_id, started)).catch_unwind();

        match tokio::time::timeout(self.config.request_timeout, pipeline).await {
            Ok(Ok(gated)) => Ok(gated),
            Ok(Err(panic)) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(
                    request_id,
                    client_id = %client,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    panic = %message,
                    "Admission pipeline panicked"
                );
                Err(AppError::Internal(message))
            }
            Err(_) => {
                tracing::error!(
                    request_id,
                    client_id = %client,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    timeout_ms = self.config.request_timeout.as_millis() as u64,
                    "Admission pipeline timed out"
                );
                Err(AppError::Timeout {
                    request_id: request_id.to_string(),
                })
            }
        }
    }

    async fn run(&self, client: &ClientId, request_id: &str, started: Instant) -> Gated {
        enter(Stage::Start, request_id);
        let connection = self.load_state.open_connection();
        enter(Stage::ConnectionOpened, request_id);

        let snapshot = self.estimate_load().await;
        enter(Stage::LoadEstimated, request_id);

        let (decision, rate) = if self.config.maintenance_mode {
            (AdmissionDecision::reject(DecisionReason::Maintenance, request_id), None)
        } else {
            let rate = self.check_rate(client).await;
            enter(Stage::RateChecked, request_id);
            let decision = self.controller.should_admit(&snapshot, rate.allowed, request_id);
            (decision, Some(rate))
        };
        let decision = decision.with_processing_time(started.elapsed().as_millis() as u64);

        let outcome = match rate {
            Some(rate) if decision.allowed() => {
                enter(Stage::Admitted, request_id);
                GateOutcome::Admitted(Admitted {
                    request_id: request_id.to_string(),
                    processing_time_ms: decision.processing_time_ms,
                    system_load: snapshot.cpu_load,
                    limit: rate.limit,
                    remaining: rate.remaining,
                })
            }
            _ => {
                enter(Stage::Rejected, request_id);
                tracing::info!(
                    request_id,
                    client_id = %client,
                    reason = %decision.reason,
                    cpu_load = snapshot.cpu_load,
                    "Request shed"
                );
                GateOutcome::Rejected(self.composer.build_rejection(decision.reason, request_id))
            }
        };

        let metrics = self.record(client, &decision, &snapshot);

        drop(connection);
        enter(Stage::ConnectionClosed, request_id);

        Gated { outcome, metrics }
    }

    fn record(
        &self,
        client: &ClientId,
        decision: &AdmissionDecision,
        snapshot: &SystemLoadSnapshot,
    ) -> JoinHandle<RecordOutcome> {
        let handle = self
            .recorder
            .record_detached(DecisionRecord::new(client, decision, snapshot));
        enter(Stage::MetricsRecorded, &decision.request_id);
        handle
    }

    /// Status mode: a load reading and the configured limits. Counts as a
    /// connection while it runs but touches no client window.
    pub async fn status(&self) -> StatusResponse {
        let _connection = self.load_state.open_connection();
        let snapshot = self.estimate_load().await;

        let status = if self.config.maintenance_mode {
            "maintenance"
        } else if snapshot.is_overloaded {
            "overloaded"
        } else {
            "healthy"
        };

        StatusResponse {
            status: status.to_string(),
            system_load: snapshot.to_view(),
            rate_limit: RateLimitInfo {
                limit: self.config.max_requests,
                window: self.config.window.as_millis() as u64,
                threshold: self.config.overload_threshold,
            },
            timestamp: Utc::now(),
        }
    }

    /// Never fails: errors, panics and timeouts all yield the safe default.
    async fn estimate_load(&self) -> SystemLoadSnapshot {
        let estimate = AssertUnwindSafe(self.estimator.estimate())
            .catch_unwind()
            .map(|outcome| {
                outcome.unwrap_or_else(|panic| {
                    Err(LoadError::Unavailable(format!(
                        "estimator panicked: {}",
                        panic_message(panic.as_ref())
                    )))
                })
            });

        guard::guarded(
            Dependency::LoadEstimator,
            self.policies.get(Dependency::LoadEstimator),
            estimate,
            || SystemLoadSnapshot::safe_default(self.load_state.active_connections()),
        )
        .await
    }

    /// Backend errors and timeouts fail open.
    async fn check_rate(&self, client: &ClientId) -> RateLimitResult {
        guard::guarded(
            Dependency::RateLimiter,
            self.policies.get(Dependency::RateLimiter),
            self.rate_limiter.check_and_record(client.as_str(), Utc::now()),
            || RateLimitResult::fail_open(self.config.max_requests, self.config.window),
        )
        .await
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
