//! 统一错误处理
//!
//! 提供应用级错误类型和错误响应结构：
//! - [`AppError`] - 应用错误枚举
//! - [`AppResponse`] - 错误响应结构
//!
//! 成功响应直接返回领域对象的 JSON；只有错误走统一信封。
//!
//! # 错误码规范
//!
//! | 前缀 | 分类 | 示例 |
//! |------|------|------|
//! | E1xxx | 认证错误 | E1001 未登录 |
//! | E2xxx | 会话错误 | E2002 会话已过期 |
//! | E3xxx | 订单错误 | E3001 非法状态流转 |
//! | E9xxx | 系统错误 | E9002 存储错误 |
//!
//! # 使用示例
//!
//! ```ignore
//! Err(AppError::not_found("Session not found"))
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// 错误响应信封
///
/// ```json
/// {
///   "code": "E2002",
///   "message": "Session expired"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// 错误码
    pub code: String,
    /// 消息
    pub message: String,
    /// 响应数据
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 应用错误枚举
///
/// 会话/订单层的 `SessionError` / `OrderError` 通过 `From` 转换进来，
/// 处理函数只需要 `?`。
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== 认证错误 (4xx) ==========
    #[error("Authentication required")]
    /// 未登录 (401)
    Unauthorized,

    #[error("Token expired")]
    /// 令牌过期 (401)
    TokenExpired,

    #[error("Invalid token")]
    /// 无效令牌 (401)
    InvalidToken,

    #[error("Permission denied: {0}")]
    /// 无权限 (403)
    Forbidden(String),

    // ========== 业务逻辑错误 (4xx) ==========
    #[error("Resource not found: {0}")]
    /// 资源不存在 (404)
    NotFound(String),

    #[error("Invalid target: {0}")]
    /// 扫码目标无效 (422)
    InvalidTarget(String),

    #[error("Session expired")]
    /// 会话已过期 (410)
    SessionExpired,

    #[error("Invalid item: {0}")]
    /// 菜品无效 (422)
    InvalidItem(String),

    #[error("Cart is empty")]
    /// 空购物车 (422)
    EmptyCart,

    #[error("Session already converted to order {0}")]
    /// 会话已转换 (409)
    AlreadyConverted(String),

    #[error("Invalid transition: {0}")]
    /// 非法状态流转 (422)
    InvalidTransition(String),

    #[error("Validation failed: {0}")]
    /// 验证失败 (400)
    Validation(String),

    #[error("Resource already exists: {0}")]
    /// 资源冲突 (409)
    Conflict(String),

    // ========== 系统错误 (5xx) ==========
    #[error("Storage error: {0}")]
    /// 存储错误 (500)
    Storage(String),

    #[error("Internal server error: {0}")]
    /// 内部错误 (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // Authentication errors (401)
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "E1001", self.to_string()),
            AppError::TokenExpired => (StatusCode::UNAUTHORIZED, "E1003", self.to_string()),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "E1002", self.to_string()),

            // Authorization errors (403)
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "E1004", self.to_string()),

            // Not found (404)
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "E0003", self.to_string()),

            // Scan target rejected (422)
            AppError::InvalidTarget(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E2001", self.to_string())
            }

            // Session gone (410)
            AppError::SessionExpired => (StatusCode::GONE, "E2002", self.to_string()),

            // Cart problems (422)
            AppError::InvalidItem(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E2003", self.to_string())
            }
            AppError::EmptyCart => (StatusCode::UNPROCESSABLE_ENTITY, "E2004", self.to_string()),

            // Conversion race loser (409)
            AppError::AlreadyConverted(_) => (StatusCode::CONFLICT, "E2005", self.to_string()),

            // Order state machine (422)
            AppError::InvalidTransition(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "E3001", self.to_string())
            }

            // Validation (400)
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "E0002", self.to_string()),

            // Conflict (409)
            AppError::Conflict(_) => (StatusCode::CONFLICT, "E0004", self.to_string()),

            // Storage errors (500)
            AppError::Storage(msg) => {
                error!(target: "storage", error = %msg, "Storage error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Storage error".to_string(),
                )
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(AppResponse::<()> {
            code: code.to_string(),
            message,
            data: None,
        });

        (status, body).into_response()
    }
}

// ========== Helper Constructors ==========

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_target(msg: impl Into<String>) -> Self {
        Self::InvalidTarget(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

impl From<crate::store::StoreError> for AppError {
    fn from(e: crate::store::StoreError) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<crate::catalog::CatalogError> for AppError {
    fn from(e: crate::catalog::CatalogError) -> Self {
        use crate::catalog::CatalogError;
        match e {
            CatalogError::NotFound(msg) => AppError::NotFound(msg),
            CatalogError::Inactive(msg) => AppError::InvalidTarget(msg),
            CatalogError::Conflict(msg) => AppError::Conflict(msg),
            CatalogError::Store(e) => e.into(),
        }
    }
}

impl From<crate::sessions::SessionError> for AppError {
    fn from(e: crate::sessions::SessionError) -> Self {
        use crate::sessions::SessionError;
        match e {
            SessionError::NotFound(msg) => AppError::NotFound(msg),
            SessionError::InvalidTarget(msg) => AppError::InvalidTarget(msg),
            SessionError::Expired => AppError::SessionExpired,
            SessionError::InvalidItem(msg) => AppError::InvalidItem(msg),
            SessionError::EmptyCart => AppError::EmptyCart,
            SessionError::AlreadyConverted(order_id) => AppError::AlreadyConverted(order_id),
            SessionError::Store(e) => e.into(),
        }
    }
}

impl From<crate::orders::OrderError> for AppError {
    fn from(e: crate::orders::OrderError) -> Self {
        use crate::orders::OrderError;
        match e {
            OrderError::NotFound(msg) => AppError::NotFound(msg),
            OrderError::InvalidTransition(msg) => AppError::InvalidTransition(msg),
            OrderError::Store(e) => e.into(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
