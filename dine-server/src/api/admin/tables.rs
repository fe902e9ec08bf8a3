//! 桌台管理 Handlers

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use shared::{DiningTable, DiningTableCreate, DiningTableUpdate};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::AppResult;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(deactivate))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub restaurant_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    #[validate(length(min = 1))]
    pub restaurant_id: String,
    #[validate(length(min = 1, max = 32))]
    pub label: String,
}

/// GET /api/admin/tables?restaurant_id=
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<DiningTable>>> {
    Ok(Json(state.catalog.list_tables(&query.restaurant_id)))
}

/// POST /api/admin/tables
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<DiningTable>> {
    payload.validate()?;
    let table = state.catalog.create_table(DiningTableCreate {
        restaurant_id: payload.restaurant_id,
        label: payload.label,
    })?;
    Ok(Json(table))
}

/// PUT /api/admin/tables/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<DiningTableUpdate>,
) -> AppResult<Json<DiningTable>> {
    let table = state.catalog.update_table(&id, payload)?;
    Ok(Json(table))
}

/// DELETE /api/admin/tables/:id - 软停用
pub async fn deactivate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<DiningTable>> {
    let table = state.catalog.deactivate_table(&id)?;
    Ok(Json(table))
}
