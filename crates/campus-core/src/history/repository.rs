//! HistoryRepository trait definition.
//!
//! Append-only persistence of broadcast chat messages with paginated
//! newest-first retrieval. Implementations live in campus-infra
//! (e.g., `SqliteHistoryRepository`).

use campus_types::chat::{ChatMessage, HistoryRecord};
use campus_types::error::RepositoryError;

/// Repository trait for chat history persistence.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait HistoryRepository: Send + Sync {
    /// Append a message and return its store-assigned id.
    fn append(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<i64, RepositoryError>> + Send;

    /// List messages ordered by timestamp DESC (newest first).
    fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> impl std::future::Future<Output = Result<Vec<HistoryRecord>, RepositoryError>> + Send;

    /// Total number of stored messages.
    fn count(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
