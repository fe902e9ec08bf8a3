//! 购物车会话 API 模块

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", post(handler::create))
        .route("/{id}/cart", get(handler::get_cart).put(handler::mutate_cart))
        .route("/{id}/order", post(handler::convert))
}
