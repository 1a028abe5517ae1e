//! Session store port consumed by the auth layer next to the gateway.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::Session;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, user: &str) -> Result<Session, SessionError>;

    /// Look up a live session. Store failures read as `None`.
    async fn validate_session(&self, id: Uuid) -> Option<Session>;

    /// Returns whether a session was removed.
    async fn delete_session(&self, id: Uuid) -> Result<bool, SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session backend unavailable: {0}")]
    Unavailable(String),

    #[error("Session store failed: {0}")]
    Operation(String),
}
