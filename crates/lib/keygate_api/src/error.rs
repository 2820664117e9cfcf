//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keygate_core::auth::AuthError;
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Every response carries a stable snake_case `error` code plus a human
/// message. Internal details are logged, never returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("Invalid client credentials")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    /// Request authentication failed; `code` names the reason.
    #[error("Unauthorized: {message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    fn unauthorized(code: &'static str, e: &AuthError) -> Self {
        AppError::Unauthorized {
            code,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::MissingFields(_) => (StatusCode::BAD_REQUEST, "missing_fields", self.to_string()),
            AppError::UnsupportedGrantType(_) => (
                StatusCode::BAD_REQUEST,
                "unsupported_grant_type",
                self.to_string(),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::InvalidOrExpiredRefreshToken => (
                StatusCode::UNAUTHORIZED,
                "invalid_or_expired_refresh_token",
                self.to_string(),
            ),
            AppError::Unauthorized { code, message } => {
                (StatusCode::UNAUTHORIZED, *code, message.clone())
            }
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, "forbidden", m.clone()),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, "not_found", format!("{m} not found")),
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, "validation_error", m.clone()),
            AppError::Internal(detail) => {
                error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error".to_string(),
                )
            }
        };
        let body = Json(ErrorResponse {
            error: code.to_string(),
            message,
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingFields(fields) => AppError::MissingFields(fields),
            AuthError::UnsupportedGrantType(g) => AppError::UnsupportedGrantType(g),
            AuthError::InvalidCredentials => AppError::InvalidCredentials,
            AuthError::InvalidOrExpiredRefreshToken => AppError::InvalidOrExpiredRefreshToken,
            AuthError::TokenMissing => AppError::unauthorized("token_missing", &e),
            AuthError::InvalidTokenFormat => AppError::unauthorized("invalid_token_format", &e),
            AuthError::Expired => AppError::unauthorized("token_expired", &e),
            AuthError::Malformed => AppError::unauthorized("invalid_token", &e),
            AuthError::WrongType { .. } => AppError::unauthorized("wrong_token_type", &e),
            AuthError::UnknownOrInactiveClient => AppError::unauthorized("invalid_client", &e),
            AuthError::Forbidden(m) => AppError::Forbidden(m),
            AuthError::NotFound(m) => AppError::NotFound(m),
            AuthError::ValidationError(m) => AppError::Validation(m),
            AuthError::DbError(e) => AppError::Internal(e.to_string()),
            AuthError::Internal(m) => AppError::Internal(m),
        }
    }
}
