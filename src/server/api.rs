//! Collection CRUD handlers: `{base}api/{collection}[/{id}]`.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::{error::ApiError, AppState};
use crate::models::Item;

#[derive(Serialize)]
pub struct CreatedResponse {
    id: String,
    success: bool,
}

#[derive(Serialize)]
pub struct UpdatedResponse {
    success: bool,
    id: String,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    success: bool,
}

/// List all items of a collection
pub async fn list(
    State(state): State<AppState>,
    Path(collection): Path<String>,
) -> Json<Vec<Item>> {
    Json(state.collections.list(&collection).await)
}

/// Add an item to a collection
pub async fn create(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: Result<Json<Item>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(item) = body?;
    let id = state.collections.create(&collection, item).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse { id, success: true }),
    ))
}

/// Merge fields into an existing item
pub async fn update(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: Result<Json<Item>, JsonRejection>,
) -> Result<Json<UpdatedResponse>, ApiError> {
    let Json(patch) = body?;
    state.collections.update(&collection, &id, patch).await?;
    Ok(Json(UpdatedResponse { success: true, id }))
}

/// Remove an item
pub async fn delete(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> Result<Json<DeletedResponse>, ApiError> {
    state.collections.delete(&collection, &id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
