//! Data Transfer Objects - request/response types for the admission API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::response::FieldError;

/// Upper bound for simulated connections in one request.
pub const MAX_SIMULATED_CONNECTIONS: u64 = 10_000;

/// Body of `POST /api/admission/simulate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRequest {
    pub simulate_load: bool,
    #[serde(default)]
    pub connections: i64,
    #[serde(default)]
    pub load: f64,
}

impl SimulationRequest {
    /// Field-level validation. An empty list means the request is acceptable.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();

        if !u64::try_from(self.connections).is_ok_and(|c| c <= MAX_SIMULATED_CONNECTIONS) {
            errors.push(FieldError::new(
                "connections",
                format!("must be an integer within [0, {MAX_SIMULATED_CONNECTIONS}]"),
            ));
        }
        if !self.load.is_finite() || !(0.0..=1.0).contains(&self.load) {
            errors.push(FieldError::new("load", "must be a number within [0, 1]"));
        }

        errors
    }
}

/// Result of applying a simulation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResponse {
    pub success: bool,
    pub simulated_connections: u64,
    pub simulated_load: f64,
}

/// Point-in-time load reading as exposed on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemLoadView {
    pub cpu_load: f64,
    pub memory_usage: f64,
    pub active_connections: u64,
    pub is_overloaded: bool,
    pub timestamp: DateTime<Utc>,
}

/// Limits reported by status mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitInfo {
    pub limit: u32,
    /// Window length in milliseconds.
    pub window: u64,
    /// Overload threshold for `cpuLoad`.
    pub threshold: f64,
}

/// Body of `GET /api/admission?status=true`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub system_load: SystemLoadView,
    pub rate_limit: RateLimitInfo,
    pub timestamp: DateTime<Utc>,
}

/// Per-request metrics echoed back to admitted callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmittedMetrics {
    /// Milliseconds spent in admission.
    pub processing_time: u64,
    pub system_load: f64,
    pub request_id: String,
}

/// Body of an admitted `GET /api/admission`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmittedResponse {
    pub success: bool,
    pub metrics: AdmittedMetrics,
}
