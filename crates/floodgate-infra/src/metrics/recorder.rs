//! Metrics recorder: durable sink first, local log on failure, never an
//! error for the caller.

use std::sync::Arc;

use tokio::task::JoinHandle;

use floodgate_core::domain::DecisionRecord;
use floodgate_core::ports::MetricsSink;
use floodgate_core::{Dependency, DependencyPolicy};

use crate::guard;

/// Where a record ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Durable,
    Fallback,
    Dropped,
}

pub struct MetricsRecorder {
    durable: Arc<dyn MetricsSink>,
    fallback: Arc<dyn MetricsSink>,
    policy: DependencyPolicy,
}

impl MetricsRecorder {
    pub fn new(
        durable: Arc<dyn MetricsSink>,
        fallback: Arc<dyn MetricsSink>,
        policy: DependencyPolicy,
    ) -> Self {
        tracing::info!(
            durable = durable.name(),
            fallback = fallback.name(),
            timeout_ms = policy.timeout.as_millis() as u64,
            "Metrics recorder initialized"
        );
        Self {
            durable,
            fallback,
            policy,
        }
    }

    pub async fn record(&self, record: DecisionRecord) -> RecordOutcome {
        let durable = guard::within(
            Dependency::MetricsSink,
            self.policy,
            self.durable.write(&record),
        )
        .await;
        if durable.is_ok() {
            return RecordOutcome::Durable;
        }

        match self.fallback.write(&record).await {
            Ok(()) => RecordOutcome::Fallback,
            Err(e) => {
                tracing::error!(
                    request_id = %record.request_id,
                    sink = self.fallback.name(),
                    error = %e,
                    "Fallback metrics sink failed, record dropped"
                );
                RecordOutcome::Dropped
            }
        }
    }

    /// Record on a background task so the response path never waits.
    pub fn record_detached(self: &Arc<Self>, record: DecisionRecord) -> JoinHandle<RecordOutcome> {
        let recorder = Arc::clone(self);
        tokio::spawn(async move { recorder.record(record).await })
    }
}
