//! OAuth2 token endpoint.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use tracing::debug;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{TokenRequest, TokenResponse};
use crate::services::auth;

/// `POST /oauth/token`: `client_credentials` or `refresh_token` grant.
pub async fn token_handler(
    State(state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(request) = body.map_err(|rejection| {
        debug!(error = %rejection.body_text(), "unreadable token request");
        AppError::MissingFields("grant_type".into())
    })?;
    let resp = auth::grant(&state, request).await?;
    Ok(Json(resp))
}
