use std::sync::Arc;
use std::time::Duration;

use shared::OrderTransitionEvent;
use tokio::sync::broadcast;

use crate::auth::JwtService;
use crate::catalog::CatalogService;
use crate::core::{BackgroundTasks, Config, TaskKind};
use crate::notify::{LogSink, NotificationSink, NotificationWorker, WebhookSink};
use crate::orders::OrderManager;
use crate::sessions::SessionManager;
use crate::store::{Store, StoreError};
use crate::utils::AppError;

/// 事件广播通道容量
///
/// 溢出时最慢的订阅者丢最旧的事件 (best-effort 语义允许)
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是服务的核心数据结构，持有所有服务的共享引用。
/// 使用 Arc 实现浅拷贝，克隆成本极低。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | store | Store | 嵌入式数据库 (redb) |
/// | catalog | Arc<CatalogService> | 餐厅/桌台/菜单目录 |
/// | sessions | Arc<SessionManager> | 购物车会话 |
/// | orders | Arc<OrderManager> | 订单状态机 |
/// | jwt_service | Arc<JwtService> | 员工 JWT 验证 |
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库
    pub store: Store,
    /// 目录服务
    pub catalog: Arc<CatalogService>,
    /// 会话管理器
    pub sessions: Arc<SessionManager>,
    /// 订单状态机
    pub orders: Arc<OrderManager>,
    /// JWT 认证服务
    pub jwt_service: Arc<JwtService>,
    /// 订单流转事件通道 (发送端)
    events: broadcast::Sender<OrderTransitionEvent>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/dine.redb)
    /// 3. 目录缓存预热
    /// 4. 会话管理器 / 订单状态机 / JWT
    pub fn initialize(config: &Config) -> Result<Self, AppError> {
        config
            .ensure_work_dir_structure()
            .map_err(|e| AppError::internal(format!("work dir setup failed: {}", e)))?;

        let store = Store::open(config.database_path()).map_err(store_init_err)?;
        Self::with_store(config, store)
    }

    /// 基于已打开的数据库构建状态 (测试用内存库走这里)
    pub fn with_store(config: &Config, store: Store) -> Result<Self, AppError> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let catalog = Arc::new(CatalogService::new(store.clone()).map_err(|e| {
            AppError::internal(format!("catalog warmup failed: {}", e))
        })?);
        let sessions = Arc::new(SessionManager::new(
            store.clone(),
            catalog.clone(),
            config.session_ttl_millis(),
            config.pending_timeout_millis(),
            events.clone(),
        ));
        let orders = Arc::new(OrderManager::new(store.clone(), events.clone()));
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Ok(Self {
            config: config.clone(),
            store,
            catalog,
            sessions,
            orders,
            jwt_service,
            events,
        })
    }

    /// 订阅订单流转事件
    pub fn subscribe_events(&self) -> broadcast::Receiver<OrderTransitionEvent> {
        self.events.subscribe()
    }

    /// 启动后台任务
    ///
    /// 必须在 `Server::run()` 内调用
    ///
    /// 启动的任务：
    /// - 会话过期清扫 (Periodic)
    /// - 待确认订单自动取消定时器 (Periodic)
    /// - 通知分发工作者 (Worker)
    pub fn start_background_tasks(&self, tasks: &mut BackgroundTasks) {
        let interval = Duration::from_secs(self.config.sweep_interval_secs);

        let sessions = self.sessions.clone();
        let token = tasks.shutdown_token();
        let sweep_interval = interval;
        tasks.spawn("session_sweeper", TaskKind::Periodic, async move {
            let mut ticker = tokio::time::interval(sweep_interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = sessions.expire_stale() {
                            tracing::error!(error = %e, "Session sweep failed");
                        }
                    }
                }
            }
        });

        let orders = self.orders.clone();
        let token = tasks.shutdown_token();
        tasks.spawn("pending_autocancel", TaskKind::Periodic, async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = orders.cancel_overdue() {
                            tracing::error!(error = %e, "Pending auto-cancel sweep failed");
                        }
                    }
                }
            }
        });

        let sink: Arc<dyn NotificationSink> = match &self.config.notify_webhook_url {
            Some(url) => {
                tracing::info!(url = %url, "Order events will be pushed to webhook");
                Arc::new(WebhookSink::new(url.clone()))
            }
            None => Arc::new(LogSink),
        };
        let receiver = self.subscribe_events();
        let token = tasks.shutdown_token();
        tasks.spawn("notification_worker", TaskKind::Worker, async move {
            NotificationWorker::new(sink).run(receiver, token).await;
        });

        tasks.log_summary();
    }
}

fn store_init_err(e: StoreError) -> AppError {
    AppError::storage(format!("store init failed: {}", e))
}
