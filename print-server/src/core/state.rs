use std::path::Path;
use std::sync::Arc;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::message::MessageBus;
use crate::printing::PrintDispatcher;
use crate::utils::{AppError, AppResult, ErrorCode};

/// 服务器状态 - 所有请求共享
///
/// Clone 只复制句柄 (pool / bus / Arc)，可以直接放进 axum 的 State。
///
/// ```ignore
/// let state = ServerState::initialize(&config).await?;
/// let report = state.dispatcher().print_order(77, 3).await?;
/// ```
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: DbService,
    /// 广播总线 (与服务器共用关闭令牌)
    pub message_bus: MessageBus,
    pub dispatcher: PrintDispatcher,
    pub jwt_service: Arc<JwtService>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 工作目录和日志目录
    /// 2. 数据库 (迁移)
    /// 3. 消息总线、打印分发器、JWT
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        ensure_dir(Path::new(&config.work_dir))?;
        ensure_dir(&config.log_dir())?;

        let db = DbService::new(&config.database_path).await?;
        Ok(Self::with_db(config.clone(), db))
    }

    /// 在已打开的数据库上组装状态 (测试使用内存库)
    pub fn with_db(config: Config, db: DbService) -> Self {
        let message_bus = MessageBus::with_capacity(config.bus_channel_capacity);
        let dispatcher = PrintDispatcher::new(db.pool.clone(), Arc::new(message_bus.clone()))
            .with_retry_delay(config.print_retry_delay());
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));

        Self {
            config,
            db,
            message_bus,
            dispatcher,
            jwt_service,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn message_bus(&self) -> &MessageBus {
        &self.message_bus
    }

    pub fn dispatcher(&self) -> &PrintDispatcher {
        &self.dispatcher
    }

    /// 服务器关闭令牌 (即消息总线的令牌)
    pub fn shutdown_token(&self) -> &CancellationToken {
        self.message_bus.shutdown_token()
    }
}

fn ensure_dir(path: &Path) -> AppResult<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        AppError::with_message(
            ErrorCode::ConfigError,
            format!("Failed to create {}: {}", path.display(), e),
        )
    })
}
