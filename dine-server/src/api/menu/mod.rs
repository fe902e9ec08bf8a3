//! 扫码菜单 API 模块

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/menu/{slug}/{table}", get(handler::get_menu))
}
