//! Print Server - 餐厅 POS 打印通知中继
//!
//! 订单 (或部分菜品) 需要打印时构造快照，发布到门店频道
//! `print-orders-<storeUuid>`，由订阅该频道的本地打印客户端接收。
//!
//! ```text
//! print-server/src/
//! ├── core/          # 配置、状态、启动
//! ├── auth/          # JWT 认证、按请求的用户上下文
//! ├── db/            # SQLite 连接与只读仓储
//! ├── message/       # 广播总线、传输层、TCP 中继
//! ├── printing/      # 通知构造、频道解析、分发
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 日志、错误类型
//! ```

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod message;
pub mod printing;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use crate::core::{Config, Server, ServerState};
pub use message::MessageBus;
pub use printing::{DispatchReport, PrintDispatcher, PrintError};
pub use utils::{ApiResponse, AppError, AppResult, ErrorCategory, ErrorCode};

pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

/// 加载 `.env` 并初始化日志
///
/// 日志在读取完整配置之前初始化，配置加载期间的告警也会被记录。
/// 日志目录为 `$WORK_DIR/logs`，无法创建时只输出到终端。
pub fn setup_environment() {
    // 没有 .env 文件是正常情况
    dotenv::dotenv().ok();

    let level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let json = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);
    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/print-relay".into());
    let log_dir = std::path::Path::new(&work_dir).join("logs");
    let log_dir = std::fs::create_dir_all(&log_dir)
        .ok()
        .map(|_| log_dir.to_string_lossy().into_owned());

    init_logger_with_file(Some(&level), json, log_dir.as_deref());
}

pub fn print_banner() {
    println!(
        r#"
    ____       _       __
   / __ \_____(_)___  / /_
  / /_/ / ___/ / __ \/ __/
 / ____/ /  / / / / / /_
/_/   /_/  /_/_/ /_/\__/   relay v{}
    "#,
        env!("CARGO_PKG_VERSION")
    );
}
