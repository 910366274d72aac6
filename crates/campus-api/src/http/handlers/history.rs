//! Chat history handler.

use axum::extract::{Query, State};
use axum::Json;

use campus_core::history::HistoryPage;

use crate::http::error::AppError;
use crate::http::extractors::identity::AuthenticatedUser;
use crate::http::extractors::query::HistoryQuery;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// GET /api/v1/chat/history - Stored chat messages, newest first.
///
/// `limit` defaults to the configured page size and is capped at the
/// configured maximum; `offset` defaults to 0.
pub async fn get_history(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<HistoryPage>>, AppError> {
    let timer = RequestTimer::start();
    let page = state.history.page(query.limit, query.offset).await?;

    let next = next_link(&page);

    let mut resp = ApiResponse::new(page, timer.meta()).with_link("self", HISTORY_PATH);
    if let Some(next) = next {
        resp = resp.with_link("next", next);
    }
    Ok(Json(resp))
}

const HISTORY_PATH: &str = "/api/v1/chat/history";

/// Link to the page after `page`, if more rows exist and the next offset
/// is representable.
fn next_link(page: &HistoryPage) -> Option<String> {
    let seen = page.offset.saturating_add(page.records.len() as i64);
    if u64::try_from(seen).ok()? >= page.total {
        return None;
    }
    let offset = page.offset.checked_add(page.limit)?;
    Some(format!("{HISTORY_PATH}?limit={}&offset={offset}", page.limit))
}
