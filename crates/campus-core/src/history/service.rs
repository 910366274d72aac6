//! History service: pagination rules on top of a [`HistoryRepository`].

use campus_types::chat::{ChatMessage, HistoryRecord};
use campus_types::config::ChatConfig;
use campus_types::error::RepositoryError;
use serde::Serialize;
use thiserror::Error;

use super::repository::HistoryRepository;

/// Errors returned by the history service.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The caller asked for an impossible page.
    #[error("invalid page: {0}")]
    InvalidPage(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One page of history, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryPage {
    pub records: Vec<HistoryRecord>,
    pub limit: i64,
    pub offset: i64,
    pub total: u64,
}

/// Chat history reads and writes, generic over the storage backend.
pub struct HistoryService<R: HistoryRepository> {
    repo: R,
    default_page_size: i64,
    max_page_size: i64,
}

impl<R: HistoryRepository> HistoryService<R> {
    pub fn new(repo: R, default_page_size: i64, max_page_size: i64) -> Self {
        let max_page_size = max_page_size.max(1);
        Self {
            repo,
            default_page_size: default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    pub fn from_config(repo: R, config: &ChatConfig) -> Self {
        Self::new(repo, config.history_page_size, config.max_page_size)
    }

    /// Persist one message, returning its id.
    pub async fn append(&self, message: &ChatMessage) -> Result<i64, HistoryError> {
        Ok(self.repo.append(message).await?)
    }

    /// Fetch a page of history.
    ///
    /// `limit` defaults to the configured page size and is capped at the
    /// maximum; `offset` defaults to 0. Negative values are rejected.
    pub async fn page(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<HistoryPage, HistoryError> {
        let (limit, offset) = self.resolve_page(limit, offset)?;
        let records = self.repo.list_recent(limit, offset).await?;
        let total = self.repo.count().await?;
        Ok(HistoryPage {
            records,
            limit,
            offset,
            total,
        })
    }

    fn resolve_page(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<(i64, i64), HistoryError> {
        let limit = match limit {
            None | Some(0) => self.default_page_size,
            Some(n) if n < 0 => {
                return Err(HistoryError::InvalidPage(format!("limit must be positive, got {n}")));
            }
            Some(n) => n.min(self.max_page_size),
        };
        let offset = match offset {
            None => 0,
            Some(n) if n < 0 => {
                return Err(HistoryError::InvalidPage(format!(
                    "offset must not be negative, got {n}"
                )));
            }
            Some(n) => n,
        };
        Ok((limit, offset))
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}
