//! In-memory session store - used as the secondary store, or alone when no
//! durable store is configured.
//! Note: Sessions are lost on process restart.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use floodgate_core::domain::Session;
use floodgate_core::ports::{SessionError, SessionStore};

pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Insert a session created elsewhere, e.g. mirrored from a primary store.
    pub async fn insert(&self, session: Session) {
        self.sessions.write().await.insert(session.id, session);
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(Duration::hours(24))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, user: &str) -> Result<Session, SessionError> {
        let session = Session::new(user, self.ttl);
        self.insert(session.clone()).await;
        Ok(session)
    }

    async fn validate_session(&self, id: Uuid) -> Option<Session> {
        let sessions = self.sessions.read().await;
        let session = sessions.get(&id)?;

        if session.is_expired(Utc::now()) {
            drop(sessions);
            // Clean up expired entry with write lock
            self.sessions.write().await.remove(&id);
            return None;
        }

        Some(session.clone())
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, SessionError> {
        Ok(self.sessions.write().await.remove(&id).is_some())
    }
}
