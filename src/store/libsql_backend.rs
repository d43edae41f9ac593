//! libSQL backend — async `TranscriptLog` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{TranscriptEntry, TranscriptLog};

/// libSQL transcript log.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlTranscriptLog {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlTranscriptLog {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let log = Self::from_database(db).await?;
        info!(path = %path.display(), "Transcript database opened");
        Ok(log)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db).await
    }

    async fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

#[async_trait]
impl TranscriptLog for LibSqlTranscriptLog {
    async fn save_turn(
        &self,
        session_id: &str,
        request: &str,
        query: &str,
        response: &str,
    ) -> Result<(), DatabaseError> {
        let id = Uuid::new_v4();
        let now = Utc::now().to_rfc3339();
        self.conn()
            .execute(
                "INSERT INTO transcripts (id, session_id, request, query, response, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id.to_string(), session_id, request, query, response, now],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_turn: {e}")))?;

        debug!(session_id, transcript_id = %id, "Transcript turn saved");
        Ok(())
    }

    async fn list_turns(&self, session_id: &str) -> Result<Vec<TranscriptEntry>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT id, session_id, request, query, response, created_at FROM transcripts
                 WHERE session_id = ?1 ORDER BY created_at ASC, rowid ASC",
                params![session_id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_turns: {e}")))?;

        let mut turns = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_turns row: {e}")))?
        {
            let id_str: String = row.get(0).unwrap_or_default();
            let created_str: String = row.get(5).unwrap_or_default();
            turns.push(TranscriptEntry {
                id: Uuid::parse_str(&id_str).unwrap_or_else(|_| Uuid::nil()),
                session_id: row.get(1).unwrap_or_default(),
                request: row.get(2).unwrap_or_default(),
                query: row.get(3).unwrap_or_default(),
                response: row.get(4).unwrap_or_default(),
                created_at: parse_datetime(&created_str),
            });
        }
        Ok(turns)
    }
}
