//! Primary/secondary session store chain. Writes try the primary first,
//! reads never fail.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use floodgate_core::domain::Session;
use floodgate_core::ports::{SessionError, SessionStore};

pub struct FallbackSessionStore {
    primary: Arc<dyn SessionStore>,
    secondary: Arc<dyn SessionStore>,
}

impl FallbackSessionStore {
    pub fn new(primary: Arc<dyn SessionStore>, secondary: Arc<dyn SessionStore>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl SessionStore for FallbackSessionStore {
    async fn create_session(&self, user: &str) -> Result<Session, SessionError> {
        match self.primary.create_session(user).await {
            Ok(session) => Ok(session),
            Err(e) => {
                tracing::warn!(error = %e, "Primary session store failed, using secondary");
                self.secondary.create_session(user).await
            }
        }
    }

    async fn validate_session(&self, id: Uuid) -> Option<Session> {
        if let Some(session) = self.primary.validate_session(id).await {
            return Some(session);
        }
        self.secondary.validate_session(id).await
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, SessionError> {
        let primary = self.primary.delete_session(id).await;
        let secondary = self.secondary.delete_session(id).await;

        match (primary, secondary) {
            (Ok(a), Ok(b)) => Ok(a || b),
            (Ok(a), Err(e)) | (Err(e), Ok(a)) => {
                tracing::warn!(session_id = %id, error = %e, "Session delete failed on one store");
                Ok(a)
            }
            (Err(e), Err(_)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::InMemorySessionStore;

    struct Down;

    #[async_trait]
    impl SessionStore for Down {
        async fn create_session(&self, _user: &str) -> Result<Session, SessionError> {
            Err(SessionError::Unavailable("connection refused".to_string()))
        }

        async fn validate_session(&self, _id: Uuid) -> Option<Session> {
            None
        }

        async fn delete_session(&self, _id: Uuid) -> Result<bool, SessionError> {
            Err(SessionError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn test_primary_down_uses_secondary() {
        let secondary = Arc::new(InMemorySessionStore::default());
        let store = FallbackSessionStore::new(Arc::new(Down), secondary.clone());

        let session = store.create_session("grace").await.unwrap();

        assert_eq!(store.validate_session(session.id).await, Some(session.clone()));
        assert!(store.delete_session(session.id).await.unwrap());
        assert_eq!(secondary.validate_session(session.id).await, None);
    }

    #[tokio::test]
    async fn test_validate_checks_both_stores() {
        let primary = Arc::new(InMemorySessionStore::default());
        let secondary = Arc::new(InMemorySessionStore::default());
        let store = FallbackSessionStore::new(primary.clone(), secondary.clone());

        let only_secondary = secondary.create_session("linus").await.unwrap();
        let only_primary = primary.create_session("ken").await.unwrap();

        assert!(store.validate_session(only_secondary.id).await.is_some());
        assert!(store.validate_session(only_primary.id).await.is_some());
        assert!(store.validate_session(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_delete_errors_only_when_both_fail() {
        let store = FallbackSessionStore::new(Arc::new(Down), Arc::new(Down));
        assert!(store.delete_session(Uuid::new_v4()).await.is_err());
    }
}
