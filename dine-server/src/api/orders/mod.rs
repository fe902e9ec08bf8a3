//! 订单 API 模块
//!
//! 公开部分只有按 ID 查询 (订单 ID 即访问凭证)；
//! 看板列表与状态流转是员工接口。

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// 公开路由：订单状态查询
pub fn public_router() -> Router<ServerState> {
    Router::new().route("/api/orders/{id}", get(handler::get_by_id))
}

/// 员工路由：看板列表 + 状态流转
pub fn staff_router() -> Router<ServerState> {
    Router::new()
        .route("/api/orders", get(handler::list))
        .route("/api/orders/{id}/status", put(handler::update_status))
}
