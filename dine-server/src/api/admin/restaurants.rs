//! 餐厅管理 Handlers

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use serde::Deserialize;
use shared::{Restaurant, RestaurantCreate, RestaurantUpdate};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::AppResult;

pub fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", axum::routing::put(update).delete(deactivate))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRequest {
    #[validate(length(min = 1, max = 64))]
    pub slug: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
}

/// GET /api/admin/restaurants
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Restaurant>>> {
    Ok(Json(state.catalog.list_restaurants()))
}

/// POST /api/admin/restaurants
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateRequest>,
) -> AppResult<Json<Restaurant>> {
    payload.validate()?;
    let restaurant = state.catalog.create_restaurant(RestaurantCreate {
        slug: payload.slug,
        name: payload.name,
    })?;
    Ok(Json(restaurant))
}

/// PUT /api/admin/restaurants/:id
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<RestaurantUpdate>,
) -> AppResult<Json<Restaurant>> {
    let restaurant = state.catalog.update_restaurant(&id, payload)?;
    Ok(Json(restaurant))
}

/// DELETE /api/admin/restaurants/:id - 软停用
pub async fn deactivate(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Restaurant>> {
    let restaurant = state.catalog.deactivate_restaurant(&id)?;
    Ok(Json(restaurant))
}
