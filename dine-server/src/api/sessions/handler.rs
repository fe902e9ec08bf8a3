//! 购物车会话 API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::{CartOp, ContactInfo, Order, Session};
use validator::Validate;

use crate::core::ServerState;
use crate::utils::AppResult;

/// 创建会话请求 (二维码负载)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSessionRequest {
    #[validate(length(min = 1, max = 64))]
    pub restaurant_slug: String,
    #[validate(length(min = 1, max = 32))]
    pub table_label: String,
}

/// 下单请求 (可选联系方式)
#[derive(Debug, Deserialize, Validate)]
pub struct ConvertRequest {
    #[validate(length(max = 64))]
    pub name: Option<String>,
    #[validate(length(max = 32))]
    pub phone: Option<String>,
}

/// 购物车视图：会话 + 当前合计
#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub total_cents: i64,
    #[serde(flatten)]
    pub session: Session,
}

fn cart_view(session: Session) -> CartResponse {
    CartResponse {
        total_cents: session.cart_total_cents(),
        session,
    }
}

/// POST /api/sessions - 扫码创建会话
pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<CreateSessionRequest>,
) -> AppResult<Json<CartResponse>> {
    payload.validate()?;
    let session = state
        .sessions
        .create_session(&payload.restaurant_slug, &payload.table_label)?;
    Ok(Json(cart_view(session)))
}

/// GET /api/sessions/:id/cart - 查看购物车
pub async fn get_cart(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<CartResponse>> {
    let session = state.sessions.get_session(&id)?;
    Ok(Json(cart_view(session)))
}

/// PUT /api/sessions/:id/cart - 修改购物车 (add | update | remove)
pub async fn mutate_cart(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(op): Json<CartOp>,
) -> AppResult<Json<CartResponse>> {
    let session = state.sessions.mutate_cart(&id, op)?;
    Ok(Json(cart_view(session)))
}

/// POST /api/sessions/:id/order - 将购物车转为订单
pub async fn convert(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    Json(payload): Json<ConvertRequest>,
) -> AppResult<Json<Order>> {
    payload.validate()?;
    let contact = if payload.name.is_some() || payload.phone.is_some() {
        Some(ContactInfo {
            name: payload.name,
            phone: payload.phone,
        })
    } else {
        None
    };
    let order = state.sessions.convert_to_order(&id, contact)?;
    Ok(Json(order))
}
