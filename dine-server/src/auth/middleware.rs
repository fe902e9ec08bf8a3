//! 认证中间件
//!
//! 员工路由 (订单看板、状态流转、后台 CRUD) 挂载这里的中间件；
//! 扫码端接口全部公开，不经过认证。

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::{CurrentStaff, JwtService};
use crate::core::ServerState;
use crate::utils::AppError;

/// 员工认证中间件
///
/// 从 `Authorization: Bearer <token>` 头提取并验证 JWT。
/// 验证成功后将 [`CurrentStaff`] 注入请求扩展。
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 Unauthorized |
/// | 令牌过期 | 401 TokenExpired |
/// | 无效令牌 | 401 InvalidToken |
pub async fn require_staff(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = auth_header
        .and_then(JwtService::extract_from_header)
        .ok_or(AppError::Unauthorized)?;

    match state.jwt_service.validate_token(token) {
        Ok(claims) => {
            let staff = CurrentStaff::from(claims);
            req.extensions_mut().insert(staff);
            Ok(next.run(req).await)
        }
        Err(e) => {
            tracing::warn!(
                target: "security",
                error = %e,
                uri = %req.uri(),
                "Staff authentication failed"
            );
            match e {
                crate::auth::JwtError::ExpiredToken => Err(AppError::TokenExpired),
                _ => Err(AppError::InvalidToken),
            }
        }
    }
}

/// 管理员中间件 - 要求 `role == "admin"`
///
/// 必须挂载在 [`require_staff`] 之后。
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let staff = req
        .extensions()
        .get::<CurrentStaff>()
        .ok_or(AppError::Unauthorized)?;

    if !staff.is_admin() {
        tracing::warn!(
            target: "security",
            staff_id = %staff.id,
            role = %staff.role,
            "Admin access denied"
        );
        return Err(AppError::forbidden("admin role required"));
    }

    Ok(next.run(req).await)
}
