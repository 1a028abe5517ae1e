//! Metrics sink port.

use async_trait::async_trait;

use crate::domain::DecisionRecord;

/// Destination for decision records.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    async fn write(&self, record: &DecisionRecord) -> Result<(), MetricsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Write failed: {0}")]
    Write(String),
}
