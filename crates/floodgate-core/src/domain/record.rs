use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AdmissionDecision, ClientId, DecisionReason, SystemLoadSnapshot};

/// One row written by the metrics recorder per admission decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionRecord {
    pub request_id: String,
    pub client_id: String,
    pub allowed: bool,
    pub reason: DecisionReason,
    pub system_load: f64,
    pub active_connections: u64,
    pub processing_time_ms: u64,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn new(
        client_id: &ClientId,
        decision: &AdmissionDecision,
        snapshot: &SystemLoadSnapshot,
    ) -> Self {
        Self {
            request_id: decision.request_id.clone(),
            client_id: client_id.to_string(),
            allowed: decision.allowed(),
            reason: decision.reason,
            system_load: snapshot.cpu_load,
            active_connections: snapshot.active_connections,
            processing_time_ms: decision.processing_time_ms,
            recorded_at: Utc::now(),
        }
    }
}
