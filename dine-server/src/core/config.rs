use std::path::PathBuf;

use crate::auth::JwtConfig;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/dine | 工作目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | SESSION_TTL_MINUTES | 120 | 会话有效期(分钟) |
/// | PENDING_TIMEOUT_MINUTES | 10 | 待确认订单自动取消超时(分钟) |
/// | SWEEP_INTERVAL_SECS | 60 | 后台清扫间隔(秒) |
/// | NOTIFY_WEBHOOK_URL | (无) | 订单事件 webhook 地址 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/dine HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 会话有效期 (分钟)，创建时定格，不随活动顺延
    pub session_ttl_minutes: i64,
    /// 待确认订单自动取消超时 (分钟)
    pub pending_timeout_minutes: i64,
    /// 后台清扫间隔 (秒)：会话过期清扫 + 待确认订单定时器
    pub sweep_interval_secs: u64,
    /// 订单事件 webhook 地址 (未配置时事件仅写日志)
    pub notify_webhook_url: Option<String>,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | staging | production
    pub environment: String,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/dine".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            session_ttl_minutes: std::env::var("SESSION_TTL_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(120),
            pending_timeout_minutes: std::env::var("PENDING_TIMEOUT_MINUTES")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(60),
            notify_webhook_url: std::env::var("NOTIFY_WEBHOOK_URL").ok(),
            jwt: JwtConfig::default(),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 会话有效期 (毫秒)
    pub fn session_ttl_millis(&self) -> i64 {
        self.session_ttl_minutes * 60 * 1000
    }

    /// 待确认订单超时 (毫秒)
    pub fn pending_timeout_millis(&self) -> i64 {
        self.pending_timeout_minutes * 60 * 1000
    }

    /// 数据库目录 (work_dir/database)
    pub fn database_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database")
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        self.database_dir().join("dine.redb")
    }

    /// 日志目录 (work_dir/logs)
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 确保工作目录结构存在
    pub fn ensure_work_dir_structure(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.database_dir())?;
        std::fs::create_dir_all(self.log_dir())?;
        Ok(())
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
