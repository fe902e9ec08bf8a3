//! Dine Server - 扫码点餐核心服务
//!
//! # 架构概述
//!
//! 单体嵌入式服务：扫码解析、购物车会话、下单转换与订单状态机，
//! 全部落在一个 redb 嵌入式数据库上。
//!
//! - **目录** (`catalog`): 餐厅 / 桌台 / 菜单项，内存缓存 + 持久化
//! - **会话** (`sessions`): 带 TTL 的购物车会话与下单转换
//! - **订单** (`orders`): 固定状态流转表、待确认超时自动取消
//! - **通知** (`notify`): 订单事件 webhook / 日志投递
//! - **认证** (`auth`): 员工 JWT 校验与角色中间件
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! dine-server/src/
//! ├── core/          # 配置、状态、后台任务、服务器
//! ├── auth/          # JWT 校验、权限中间件
//! ├── catalog/       # 目录服务与缓存
//! ├── sessions/      # 购物车会话
//! ├── orders/        # 订单状态机
//! ├── notify/        # 事件投递
//! ├── api/           # HTTP 路由和处理器
//! ├── store/         # redb 存储层
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod auth;
pub mod catalog;
pub mod core;
pub mod notify;
pub mod orders;
pub mod sessions;
pub mod store;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentStaff, JwtService};
pub use catalog::CatalogService;
pub use core::{Config, Server, ServerState};
pub use orders::OrderManager;
pub use sessions::SessionManager;
pub use store::Store;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境 (dotenv, 工作目录, 日志)
pub fn setup_environment() -> std::io::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_dir = config.log_dir();
    let log_level = std::env::var("LOG_LEVEL").ok();
    if config.is_production() {
        init_logger_with_file(log_level.as_deref(), log_dir.to_str());
    } else {
        init_logger_with_file(log_level.as_deref(), None);
    }

    Ok(config)
}
