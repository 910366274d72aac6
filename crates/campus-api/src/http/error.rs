//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use campus_core::history::HistoryError;

use crate::http::response::{ApiErrorDetail, ApiErrorResponse, RequestTimer};

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// History store errors.
    History(HistoryError),
    /// Missing or unusable caller identity.
    Unauthorized(String),
}

impl From<HistoryError> for AppError {
    fn from(e: HistoryError) -> Self {
        AppError::History(e)
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::History(HistoryError::InvalidPage(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::History(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", e.to_string())
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            tracing::error!(code, %message, "request failed");
        }

        let body = ApiErrorResponse {
            data: None,
            meta: RequestTimer::start().meta(),
            errors: vec![ApiErrorDetail { code, message }],
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_types::error::RepositoryError;

    #[test]
    fn invalid_page_maps_to_bad_request() {
        let err = AppError::from(HistoryError::InvalidPage("limit must be positive".into()));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn repository_failure_maps_to_internal_error() {
        let err = AppError::from(HistoryError::Repository(RepositoryError::Connection(
            "pool timed out".into(),
        )));
        let (status, code, _) = err.parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "INTERNAL_ERROR");
    }

    #[test]
    fn unauthorized_maps_to_401() {
        let err = AppError::Unauthorized("missing user".into());
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}
