//! Request handlers.

pub mod health;
pub mod items;
pub mod token;
pub mod users;

use axum::Json;
use axum::extract::Path;
use axum::extract::rejection::{JsonRejection, PathRejection};

use crate::error::{AppError, AppResult};

/// Unwrap a JSON body, reporting a bad body as `validation_error` instead
/// of axum's plain-text rejection.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// Unwrap a path parameter, reporting an unparsable segment as
/// `validation_error`.
pub(crate) fn path_param<T>(path: Result<Path<T>, PathRejection>) -> AppResult<T> {
    path.map(|Path(value)| value)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}
