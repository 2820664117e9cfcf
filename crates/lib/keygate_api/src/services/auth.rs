//! Token grant service for the client-credentials and refresh-token flows.

use keygate_core::auth::AuthError;
use keygate_core::auth::credentials;
use tracing::{debug, info};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{TokenRequest, TokenResponse};

pub const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
pub const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// Dispatch a token request on its `grant_type`.
pub async fn grant(state: &AppState, request: TokenRequest) -> AppResult<TokenResponse> {
    let grant_type = required("grant_type", request.grant_type.as_deref())?;
    match grant_type {
        GRANT_CLIENT_CREDENTIALS => {
            let client_id = non_empty(request.client_id.as_deref());
            let client_secret = non_empty(request.client_secret.as_deref());
            match (client_id, client_secret) {
                (Some(id), Some(secret)) => client_credentials(state, id, secret).await,
                _ => {
                    let missing: Vec<&str> =
                        [("client_id", client_id), ("client_secret", client_secret)]
                            .into_iter()
                            .filter_map(|(field, value)| value.is_none().then_some(field))
                            .collect();
                    Err(AppError::MissingFields(missing.join(", ")))
                }
            }
        }
        GRANT_REFRESH_TOKEN => {
            let token = required("refresh_token", request.refresh_token.as_deref())?;
            refresh(state, token).await
        }
        other => Err(AppError::UnsupportedGrantType(other.to_string())),
    }
}

/// Authenticate a client and issue a fresh pair.
pub async fn client_credentials(
    state: &AppState,
    client_id: &str,
    client_secret: &str,
) -> AppResult<TokenResponse> {
    let identity = credentials::authenticate(state.store.as_ref(), client_id, client_secret)
        .await?
        .ok_or(AppError::InvalidCredentials)?;
    let pair = state.tokens.issue_token_pair(&identity.client_id)?;
    info!(client_id = %identity.client_id, "issued token pair");
    Ok(TokenResponse::new(&identity, pair))
}

/// Rotate a refresh token into a new pair. Every token-level failure is
/// reported uniformly as `invalid_or_expired_refresh_token`.
pub async fn refresh(state: &AppState, refresh_token: &str) -> AppResult<TokenResponse> {
    match state.tokens.rotate(refresh_token).await {
        Ok((identity, pair)) => Ok(TokenResponse::new(&identity, pair)),
        Err(
            e @ (AuthError::Expired
            | AuthError::Malformed
            | AuthError::WrongType { .. }
            | AuthError::UnknownOrInactiveClient),
        ) => {
            debug!(error = %e, "refresh rejected");
            Err(AppError::InvalidOrExpiredRefreshToken)
        }
        Err(e) => Err(e.into()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn required<'a>(field: &str, value: Option<&'a str>) -> AppResult<&'a str> {
    non_empty(value).ok_or_else(|| AppError::MissingFields(field.to_string()))
}
