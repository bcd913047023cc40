//! Error types for the map sheet API

use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mapsheet_core::SheetError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Sheet(SheetError::QuotaExceeded { .. }) => StatusCode::FORBIDDEN,
            ApiError::Sheet(SheetError::ImageFetchFailed { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Sheet(e) if e.is_input_error() => StatusCode::BAD_REQUEST,
            ApiError::Sheet(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Sheet(e) => e.code(),
            ApiError::Unauthorized => "UNAUTHORIZED",
            ApiError::InvalidRequest(_) => "INVALID_REQUEST",
            ApiError::Database(_) => "DATABASE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Database error".to_string()
            }
            ApiError::Sheet(e @ (SheetError::Storage(_) | SheetError::Render(_))) => {
                tracing::error!("Generation failed: {}", e);
                "Could not generate the map sheet".to_string()
            }
            ApiError::Sheet(e @ SheetError::ImageFetchFailed { .. }) => {
                tracing::warn!("{}", e);
                e.to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Sheet(SheetError::QuotaExceeded { limit: 5 }), StatusCode::FORBIDDEN),
            (
                ApiError::Sheet(SheetError::ImageFetchFailed {
                    zoom: 14,
                    detail: "timeout".into(),
                }),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::Sheet(SheetError::UrlResolutionFailed), StatusCode::BAD_REQUEST),
            (ApiError::Sheet(SheetError::NoLocationProvided), StatusCode::BAD_REQUEST),
            (
                ApiError::Sheet(SheetError::Storage("locked".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::Unauthorized, StatusCode::UNAUTHORIZED),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status, "{:?}", err);
        }
    }

    #[test]
    fn test_codes_follow_core() {
        assert_eq!(
            ApiError::Sheet(SheetError::QuotaExceeded { limit: 5 }).code(),
            "QUOTA_EXCEEDED"
        );
        assert_eq!(ApiError::Unauthorized.code(), "UNAUTHORIZED");
    }
}
