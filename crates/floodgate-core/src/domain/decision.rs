use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a request was admitted or shed. Exactly one per decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    Ok,
    RateLimited,
    SystemOverload,
    Maintenance,
}

impl DecisionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Ok => "ok",
            DecisionReason::RateLimited => "rate_limited",
            DecisionReason::SystemOverload => "system_overload",
            DecisionReason::Maintenance => "maintenance",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one request.
///
/// `allowed` is derived from `reason`, so a rejection can never carry `ok`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmissionDecision {
    pub reason: DecisionReason,
    pub request_id: String,
    pub processing_time_ms: u64,
}

impl AdmissionDecision {
    pub fn new(reason: DecisionReason, request_id: impl Into<String>) -> Self {
        Self {
            reason,
            request_id: request_id.into(),
            processing_time_ms: 0,
        }
    }

    pub fn admit(request_id: impl Into<String>) -> Self {
        Self::new(DecisionReason::Ok, request_id)
    }

    pub fn reject(reason: DecisionReason, request_id: impl Into<String>) -> Self {
        Self::new(reason, request_id)
    }

    pub fn allowed(&self) -> bool {
        self.reason == DecisionReason::Ok
    }

    pub fn with_processing_time(mut self, millis: u64) -> Self {
        self.processing_time_ms = millis;
        self
    }
}
