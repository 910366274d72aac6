//! Caller identity extractor.
//!
//! Authentication happens upstream (an auth gateway validates the session
//! token). By the time a request reaches this server, the authenticated user
//! id is supplied as:
//! - `X-User-Id: <id>` header, or
//! - `?user_id=<id>` query parameter, for browser WebSocket upgrades that
//!   cannot set custom headers.
//!
//! A request without a usable id is rejected before any chat session exists.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use campus_types::session::UserId;

use crate::http::error::AppError;
use crate::state::AppState;

/// Header carrying the authenticated user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated user behind a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        extract_user_id(parts).map(AuthenticatedUser)
    }
}

#[derive(Debug, Deserialize)]
struct IdentityQuery {
    user_id: Option<String>,
}

/// Extract the user id from the header, falling back to the query string.
fn extract_user_id(parts: &Parts) -> Result<UserId, AppError> {
    if let Some(value) = parts.headers.get(USER_ID_HEADER) {
        let raw = value.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-User-Id header encoding".to_string())
        })?;
        return parse_user_id(raw);
    }

    if let Ok(Query(query)) = Query::<IdentityQuery>::try_from_uri(&parts.uri) {
        if let Some(raw) = query.user_id {
            return parse_user_id(&raw);
        }
    }

    Err(AppError::Unauthorized(
        "Missing user identity. Provide via 'X-User-Id: <id>' header or 'user_id' query parameter.".to_string(),
    ))
}

fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    raw.parse::<UserId>()
        .map_err(|_| AppError::Unauthorized(format!("Invalid user id: '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str, header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn header_is_preferred() {
        let p = parts("/ws?user_id=9", Some("4"));
        assert_eq!(extract_user_id(&p).unwrap(), UserId(4));
    }

    #[test]
    fn query_parameter_is_accepted() {
        let p = parts("/ws?user_id=12", None);
        assert_eq!(extract_user_id(&p).unwrap(), UserId(12));
    }

    #[test]
    fn missing_identity_is_unauthorized() {
        let p = parts("/ws", None);
        assert!(matches!(extract_user_id(&p), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn non_numeric_identity_is_unauthorized() {
        let p = parts("/ws", Some("alice"));
        assert!(matches!(extract_user_id(&p), Err(AppError::Unauthorized(_))));

        let p = parts("/ws?user_id=bob", None);
        assert!(matches!(extract_user_id(&p), Err(AppError::Unauthorized(_))));
    }
}
