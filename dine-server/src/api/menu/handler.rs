//! 扫码菜单 API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use shared::MenuItem;

use crate::catalog::CatalogError;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// 扫码落地页响应：餐厅 + 桌台 + 可售菜单
#[derive(Debug, Serialize)]
pub struct MenuResponse {
    pub restaurant_id: String,
    pub restaurant_name: String,
    pub table_label: String,
    pub items: Vec<MenuItem>,
}

/// GET /api/menu/:slug/:table - 解析二维码目标并返回菜单
///
/// 对外不区分"不存在"和"已停用"，统一 404，避免探测目录。
pub async fn get_menu(
    State(state): State<ServerState>,
    Path((slug, table)): Path<(String, String)>,
) -> AppResult<Json<MenuResponse>> {
    let target = state.catalog.resolve(&slug, &table).map_err(|e| match e {
        CatalogError::Inactive(msg) => AppError::not_found(msg),
        other => other.into(),
    })?;

    let items = state.catalog.menu_for_restaurant(&target.restaurant.id);

    Ok(Json(MenuResponse {
        restaurant_id: target.restaurant.id,
        restaurant_name: target.restaurant.name,
        table_label: target.table.label,
        items,
    }))
}
