//! Load estimation port.

use async_trait::async_trait;

use crate::domain::SystemLoadSnapshot;

/// Produces a fresh load reading per request.
#[async_trait]
pub trait LoadEstimator: Send + Sync {
    async fn estimate(&self) -> Result<SystemLoadSnapshot, LoadError>;

    /// In-flight plus simulated connections, used for fallback snapshots.
    fn active_connections(&self) -> u64;
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Load signal unavailable: {0}")]
    Unavailable(String),
}
