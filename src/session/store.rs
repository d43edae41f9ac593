//! Session store — where in-flight conversations live between turns.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::model::ConversationSession;
use crate::error::SessionError;

/// Backing store for active conversations.
///
/// Callers serialize access per session id (see [`super::locks::KeyedLocks`]);
/// implementations only need to be safe for concurrent use across ids.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a session. `Ok(None)` when the id is unknown.
    async fn get(&self, session_id: &str) -> Result<Option<ConversationSession>, SessionError>;

    /// Insert or replace a session.
    async fn upsert(&self, session: ConversationSession) -> Result<(), SessionError>;

    /// Remove a session, returning it.
    async fn delete(&self, session_id: &str) -> Result<ConversationSession, SessionError>;

    /// Number of active sessions.
    async fn len(&self) -> Result<usize, SessionError>;
}

/// Process-local session map. Nothing survives a restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, ConversationSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &str) -> Result<Option<ConversationSession>, SessionError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn upsert(&self, session: ConversationSession) -> Result<(), SessionError> {
        self.sessions
            .write()
            .await
            .insert(session.session_id.clone(), session);
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<ConversationSession, SessionError> {
        self.sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound {
                session_id: session_id.to_string(),
            })
    }

    async fn len(&self) -> Result<usize, SessionError> {
        Ok(self.sessions.read().await.len())
    }
}
