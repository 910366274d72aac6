//! SQLite connection pools for the chat history store.
//!
//! The server appends one row per broadcast from a single background writer
//! and serves history pages to many readers. `DatabasePool` mirrors that: a
//! single-connection writer and a small read-only pool, both on one WAL
//! database file.

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};

/// Connections in the read-only pool.
pub const READER_CONNECTIONS: u32 = 4;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Writer and reader pools over the same database file.
#[derive(Clone)]
pub struct DatabasePool {
    /// Read-only pool for history pages and counts.
    pub reader: SqlitePool,
    /// Single connection; every append is serialized through it.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if needed) the database at `path` and apply migrations.
    ///
    /// WAL lets readers proceed while the writer appends; `NORMAL` sync is
    /// durable across application crashes in that mode.
    pub async fn open(path: &Path) -> Result<Self, sqlx::Error> {
        let base = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base.clone())
            .await?;

        // The reader pool is read-only, so the schema must exist first
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(READER_CONNECTIONS)
            .connect_with(base.read_only(true))
            .await?;

        tracing::debug!(path = %path.display(), "history database opened");
        Ok(Self { reader, writer })
    }

    /// Close both pools, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.writer.close().await;
        self.reader.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_temp() -> (tempfile::TempDir, DatabasePool) {
        let dir = tempfile::tempdir().unwrap();
        let pool = DatabasePool::open(&dir.path().join("chat.db")).await.unwrap();
        (dir, pool)
    }

    #[tokio::test]
    async fn migrations_create_chat_messages() {
        let (_dir, pool) = open_temp().await;

        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'chat_messages'",
        )
        .fetch_one(&pool.reader)
        .await
        .unwrap();

        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn writer_uses_wal_with_normal_sync() {
        let (_dir, pool) = open_temp().await;

        let (mode,): (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        let (sync,): (i64,) = sqlx::query_as("PRAGMA synchronous")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(mode.to_lowercase(), "wal");
        assert_eq!(sync, 1, "NORMAL");
    }

    #[tokio::test]
    async fn reader_rejects_writes() {
        let (_dir, pool) = open_temp().await;

        let result = sqlx::query(
            "INSERT INTO chat_messages (content, sender_id, created_at) VALUES ('x', 1, '2024-05-01T00:00:00Z')",
        )
        .execute(&pool.reader)
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reopening_keeps_existing_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chat.db");

        let first = DatabasePool::open(&path).await.unwrap();
        first.close().await;

        DatabasePool::open(&path).await.unwrap();
    }
}
