//! Identity and role administration handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use keygate_core::auth::credentials::{self, Registration};
use keygate_core::models::auth::Role;
use tracing::info;

use super::json_body;
use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::Principal;
use crate::models::{AssignRoleRequest, CreateUserRequest, IdentityView, SetActiveRequest};

/// `GET /me`: the caller's own identity.
pub async fn me_handler(Extension(Principal(identity)): Extension<Principal>) -> Json<IdentityView> {
    Json((&identity).into())
}

/// `GET /users`
pub async fn list_users_handler(State(state): State<AppState>) -> AppResult<Json<Vec<IdentityView>>> {
    let identities = state.store.list_identities().await?;
    Ok(Json(identities.iter().map(IdentityView::from).collect()))
}

/// `POST /users`: register a client identity.
pub async fn create_user_handler(
    State(state): State<AppState>,
    Extension(Principal(caller)): Extension<Principal>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<IdentityView>)> {
    let body = json_body(body)?;
    let registration = Registration {
        username: body.username.unwrap_or_default(),
        email: body.email.unwrap_or_default(),
        client_id: body.client_id.unwrap_or_default(),
        client_secret: body.client_secret.unwrap_or_default(),
        password: body.password.unwrap_or_default(),
        roles: body.roles,
    };
    let identity = credentials::register(state.store.as_ref(), registration).await?;
    info!(client_id = %identity.client_id, by = %caller.client_id, "identity registered");
    Ok((StatusCode::CREATED, Json((&identity).into())))
}

/// `PUT /users/{client_id}/active`: activate or deactivate. Outstanding
/// tokens of a deactivated identity stop validating immediately.
pub async fn set_active_handler(
    State(state): State<AppState>,
    Extension(Principal(caller)): Extension<Principal>,
    Path(client_id): Path<String>,
    body: Result<Json<SetActiveRequest>, JsonRejection>,
) -> AppResult<Json<IdentityView>> {
    let body = json_body(body)?;
    if caller.client_id == client_id && !body.active {
        return Err(AppError::Validation("cannot deactivate yourself".into()));
    }
    let identity = state.store.set_active(&client_id, body.active).await?;
    info!(client_id = %client_id, active = body.active, by = %caller.client_id, "identity activation changed");
    Ok(Json((&identity).into()))
}

/// `POST /users/{client_id}/roles`
pub async fn assign_role_handler(
    State(state): State<AppState>,
    Path(client_id): Path<String>,
    body: Result<Json<AssignRoleRequest>, JsonRejection>,
) -> AppResult<Json<IdentityView>> {
    let body = json_body(body)?;
    let identity = state.store.assign_role(&client_id, &body.role).await?;
    info!(client_id = %client_id, role = %body.role, "role assigned");
    Ok(Json((&identity).into()))
}

/// `DELETE /users/{client_id}/roles/{role}`
pub async fn remove_role_handler(
    State(state): State<AppState>,
    Path((client_id, role)): Path<(String, String)>,
) -> AppResult<Json<IdentityView>> {
    let identity = state.store.remove_role(&client_id, &role).await?;
    info!(client_id = %client_id, role = %role, "role removed");
    Ok(Json((&identity).into()))
}

/// `GET /roles`: role catalog with permissions.
pub async fn list_roles_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(state.store.list_roles().await?))
}
