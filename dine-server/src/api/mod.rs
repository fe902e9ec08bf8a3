//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`menu`] - 扫码菜单 (公开)
//! - [`sessions`] - 购物车会话 (公开)
//! - [`orders`] - 订单查询 (公开) + 员工看板/状态流转
//! - [`admin`] - 后台目录管理 (管理员)
//!
//! 扫码端接口全部公开；员工接口挂载 [`require_staff`] 中间件，
//! 后台 CRUD 额外要求管理员角色。

pub mod admin;
pub mod health;
pub mod menu;
pub mod orders;
pub mod sessions;

use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_staff;
use crate::core::ServerState;

/// Compose the full application router
pub fn router(state: ServerState) -> Router {
    let public = Router::new()
        .merge(health::router())
        .merge(menu::router())
        .merge(sessions::router())
        .merge(orders::public_router());

    let staff = Router::new()
        .merge(orders::staff_router())
        .merge(admin::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_staff,
        ));

    public
        .merge(staff)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
