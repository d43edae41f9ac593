//! `TranscriptLog` trait — durable record of every webhook turn.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DatabaseError;

/// One stored turn.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub id: Uuid,
    pub session_id: String,
    /// Raw request body as received.
    pub request: String,
    /// The user's utterance.
    pub query: String,
    /// Text sent back (empty for continuation turns).
    pub response: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only transcript storage.
#[async_trait]
pub trait TranscriptLog: Send + Sync {
    /// Record one turn.
    async fn save_turn(
        &self,
        session_id: &str,
        request: &str,
        query: &str,
        response: &str,
    ) -> Result<(), DatabaseError>;

    /// All turns of a session, oldest first.
    async fn list_turns(&self, session_id: &str) -> Result<Vec<TranscriptEntry>, DatabaseError>;

    /// The session's non-empty utterances joined by single spaces, oldest first.
    /// Empty when nothing was recorded.
    async fn session_history(&self, session_id: &str) -> Result<String, DatabaseError> {
        let turns = self.list_turns(session_id).await?;
        Ok(turns
            .iter()
            .map(|t| t.query.as_str())
            .filter(|q| !q.is_empty())
            .collect::<Vec<_>>()
            .join(" "))
    }
}
