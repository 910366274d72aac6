//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for the history endpoint.
///
/// Both fields are optional; the history service applies defaults and caps.
#[derive(Debug, Deserialize, Default)]
pub struct HistoryQuery {
    /// Maximum results.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}
