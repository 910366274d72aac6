//! SQLite chat history repository implementation.
//!
//! Implements `HistoryRepository` from `campus-core` using sqlx with split
//! read/write pools. Appends go through the single writer connection; page
//! reads use the reader pool.

use campus_core::history::HistoryRepository;
use campus_types::chat::{ChatMessage, HistoryRecord};
use campus_types::error::RepositoryError;
use campus_types::session::UserId;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `HistoryRepository`.
pub struct SqliteHistoryRepository {
    pool: DatabasePool,
}

impl SqliteHistoryRepository {
    /// Create a new repository backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Internal row types
// ---------------------------------------------------------------------------

struct HistoryRow {
    id: i64,
    kind: String,
    content: String,
    sender_id: i64,
    created_at: String,
}

impl HistoryRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            kind: row.try_get("kind")?,
            content: row.try_get("content")?,
            sender_id: row.try_get("sender_id")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_record(self) -> Result<HistoryRecord, RepositoryError> {
        Ok(HistoryRecord {
            id: self.id,
            kind: self.kind,
            content: self.content,
            sender_id: UserId(self.sender_id),
            timestamp: parse_datetime(&self.created_at)?,
        })
    }
}

/// Pool and I/O failures mean the store is unreachable; anything else is a
/// problem with the statement itself.
fn map_sqlx(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_) => RepositoryError::Connection(e.to_string()),
        other => RepositoryError::Query(other.to_string()),
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

// Fixed-width UTC form so lexical order on the column matches time order.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ---------------------------------------------------------------------------
// HistoryRepository impl
// ---------------------------------------------------------------------------

impl HistoryRepository for SqliteHistoryRepository {
    async fn append(&self, message: &ChatMessage) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO chat_messages (kind, content, sender_id, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&message.kind)
        .bind(&message.content)
        .bind(message.sender_id.0)
        .bind(format_datetime(&message.timestamp))
        .execute(&self.pool.writer)
        .await
        .map_err(map_sqlx)?;

        Ok(result.last_insert_rowid())
    }

    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<HistoryRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"SELECT id, kind, content, sender_id, created_at
               FROM chat_messages
               ORDER BY created_at DESC, id DESC
               LIMIT ? OFFSET ?"#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx)?;

        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let r = HistoryRow::from_row(row).map_err(map_sqlx)?;
            records.push(r.into_record()?);
        }
        Ok(records)
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        let row = sqlx::query("SELECT COUNT(*) AS cnt FROM chat_messages")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(map_sqlx)?;

        let count: i64 = row
            .try_get("cnt")
            .map_err(map_sqlx)?;
        Ok(count.max(0) as u64)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
