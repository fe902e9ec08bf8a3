//! 后台目录管理 API 模块
//!
//! 餐厅 / 桌台 / 菜单项的增改停用。所有删除都是软停用；
//! 整个模块要求管理员角色 ([`require_admin`])。

mod menu_items;
mod restaurants;
mod tables;

use axum::{Router, middleware};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/admin/restaurants", restaurants::routes())
        .nest("/api/admin/tables", tables::routes())
        .nest("/api/admin/menu-items", menu_items::routes())
        .layer(middleware::from_fn(require_admin))
}
