//! Item CRUD handlers. Permissions are enforced by the route guards.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use keygate_core::models::item::{Item, ItemInput};

use super::{json_body, path_param};
use crate::AppState;
use crate::error::AppResult;

/// `GET /items`
pub async fn list_items_handler(State(state): State<AppState>) -> Json<Vec<Item>> {
    Json(state.items.list().await)
}

/// `GET /items/{id}`
pub async fn get_item_handler(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> AppResult<Json<Item>> {
    Ok(Json(state.items.get(path_param(id)?).await?))
}

/// `POST /items`: `name` and `price` required.
pub async fn create_item_handler(
    State(state): State<AppState>,
    body: Result<Json<ItemInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Item>)> {
    let item = state.items.create(json_body(body)?).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PUT /items/{id}`: full replacement.
pub async fn replace_item_handler(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    body: Result<Json<ItemInput>, JsonRejection>,
) -> AppResult<Json<Item>> {
    let id = path_param(id)?;
    Ok(Json(state.items.replace(id, json_body(body)?).await?))
}

/// `DELETE /items/{id}`
pub async fn delete_item_handler(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> AppResult<StatusCode> {
    state.items.delete(path_param(id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}
