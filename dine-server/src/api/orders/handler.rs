//! 订单 API Handlers

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::{Order, OrderStatus, TransitionActor};

use crate::auth::CurrentStaff;
use crate::core::ServerState;
use crate::utils::AppResult;

/// GET /api/orders/:id - 公开订单状态查询
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<Order>> {
    let order = state.orders.get_order(&id)?;
    Ok(Json(order))
}

/// 看板列表查询参数
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub restaurant_id: String,
    pub status: Option<OrderStatus>,
}

/// GET /api/orders?restaurant_id=&status= - 员工看板列表
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListOrdersQuery>,
) -> AppResult<Json<Vec<Order>>> {
    let orders = state
        .orders
        .list_orders(&query.restaurant_id, query.status)?;
    Ok(Json(orders))
}

/// 状态流转请求
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// PUT /api/orders/:id/status - 员工状态流转
pub async fn update_status(
    State(state): State<ServerState>,
    Extension(staff): Extension<CurrentStaff>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<Json<Order>> {
    let order = state.orders.transition(
        &id,
        payload.status,
        TransitionActor::Staff { staff_id: staff.id },
    )?;
    Ok(Json(order))
}
