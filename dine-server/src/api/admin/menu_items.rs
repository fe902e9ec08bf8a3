//! 菜单项管理 Handlers

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use shared::{MenuItem, MenuItemCreate, MenuItemUpdate};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

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
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub price_cents: i64,
}

/// GET /api/admin/menu-items?restaurant_id=
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<MenuItem>>> {
    Ok(Json(state.catalog.list_menu_items(&query.restaurant_id)))
}

/// POST /api/admin/menu-items
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<MenuItem>> {
    payload.validate()?;
    if payload.price_cents < 0 {
        return Err(AppError::validation("price_cents must be non-negative"));
    }
    let item = state.catalog.create_menu_item(MenuItemCreate {
        restaurant_id: payload.restaurant_id,
        name: payload.name,
        price_cents: payload.price_cents,
    })?;
    Ok(Json(item))
}

/// PUT /api/admin/menu-items/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<MenuItemUpdate>,
) -> AppResult<Json<MenuItem>> {
    if let Some(price) = payload.price_cents
        && price < 0
    {
        return Err(AppError::validation("price_cents must be non-negative"));
    }
    let item = state.catalog.update_menu_item(&id, payload)?;
    Ok(Json(item))
}

/// DELETE /api/admin/menu-items/:id - 软停用
pub async fn deactivate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<MenuItem>> {
    let item = state.catalog.deactivate_menu_item(&id)?;
    Ok(Json(item))
}
