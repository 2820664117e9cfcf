//! Authentication: secret hashing, credential checks, token codec and the
//! token lifecycle.

pub mod credentials;
pub mod jwt;
pub mod password;
pub mod tokens;

use thiserror::Error;

use crate::models::auth::TokenKind;

/// Authentication and authorization errors.
///
/// Every variant except `DbError` and `Internal` is terminal for a request
/// and safe to show to the caller.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing required fields: {0}")]
    MissingFields(String),

    #[error("Unsupported grant type: {0}")]
    UnsupportedGrantType(String),

    #[error("Invalid client credentials")]
    InvalidCredentials,

    #[error("Token is missing")]
    TokenMissing,

    #[error("Invalid token format")]
    InvalidTokenFormat,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Malformed,

    #[error("Wrong token type: expected {expected}, got {found}")]
    WrongType { expected: TokenKind, found: TokenKind },

    #[error("Unknown or inactive client")]
    UnknownOrInactiveClient,

    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredRefreshToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
