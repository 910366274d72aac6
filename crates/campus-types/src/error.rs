use thiserror::Error;

/// Errors from repository operations (used by trait definitions in campus-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The database could not be reached (pool closed or exhausted, I/O).
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),
}
