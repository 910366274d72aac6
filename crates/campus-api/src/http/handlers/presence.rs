//! Presence handler: who is connected to the hub right now.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use campus_types::session::UserId;

use crate::http::error::AppError;
use crate::http::extractors::identity::AuthenticatedUser;
use crate::http::response::{ApiResponse, RequestTimer};
use crate::state::AppState;

/// Snapshot of live hub membership.
#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    /// Number of registered sessions.
    pub sessions: usize,
    /// Distinct connected users, ascending.
    pub users: Vec<UserId>,
}

/// GET /api/v1/chat/presence - Connected sessions and users.
pub async fn get_presence(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<ApiResponse<PresenceResponse>>, AppError> {
    let timer = RequestTimer::start();
    let presence = PresenceResponse {
        sessions: state.hub.session_count(),
        users: state.hub.connected_users(),
    };

    Ok(Json(ApiResponse::new(presence, timer.meta())))
}
