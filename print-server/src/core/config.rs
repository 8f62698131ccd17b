use std::path::PathBuf;
use std::time::Duration;

use crate::auth::JwtConfig;
use crate::utils::AppResult;

/// 服务器配置 - 打印中继的所有配置项
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | /var/lib/print-relay | 工作目录 |
/// | DATABASE_PATH | $WORK_DIR/print-relay.db | SQLite 数据库文件 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | MESSAGE_TCP_PORT | 8081 | TCP 中继端口 |
/// | BUS_CHANNEL_CAPACITY | 1024 | 广播缓冲区大小 |
/// | PRINT_RETRY_DELAY_MS | 200 | 发布失败后重试前的等待(毫秒) |
/// | HANDSHAKE_TIMEOUT_MS | 5000 | 订阅握手超时(毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 日志 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/print HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库、日志等文件
    pub work_dir: String,
    /// SQLite 数据库路径
    pub database_path: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// TCP 中继端口 (打印客户端订阅)
    pub message_tcp_port: u16,
    /// 广播通道容量
    pub bus_channel_capacity: usize,
    /// 发布失败后单次重试前的等待
    pub print_retry_delay_ms: u64,
    /// 客户端必须在此时间内完成订阅握手
    pub handshake_timeout_ms: u64,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 日志级别
    pub log_level: String,
    /// 是否输出 JSON 日志
    pub log_json: bool,
    /// 运行环境: development | staging | production
    pub environment: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值。JWT 密钥缺失时在 release 构建下报错。
    pub fn from_env() -> AppResult<Self> {
        let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/print-relay".into());
        let database_path = std::env::var("DATABASE_PATH").unwrap_or_else(|_| {
            PathBuf::from(&work_dir)
                .join("print-relay.db")
                .to_string_lossy()
                .into_owned()
        });

        Ok(Self {
            work_dir,
            database_path,
            http_port: env_or("HTTP_PORT", 3000),
            message_tcp_port: env_or("MESSAGE_TCP_PORT", 8081),
            bus_channel_capacity: env_or("BUS_CHANNEL_CAPACITY", 1024),
            print_retry_delay_ms: env_or("PRINT_RETRY_DELAY_MS", 200),
            handshake_timeout_ms: env_or("HANDSHAKE_TIMEOUT_MS", 5000),
            jwt: JwtConfig::from_env()?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        })
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景，不读取环境变量
    pub fn with_overrides(
        work_dir: impl Into<String>,
        http_port: u16,
        message_tcp_port: u16,
    ) -> Self {
        let work_dir = work_dir.into();
        Self {
            database_path: PathBuf::from(&work_dir)
                .join("print-relay.db")
                .to_string_lossy()
                .into_owned(),
            work_dir,
            http_port,
            message_tcp_port,
            bus_channel_capacity: 1024,
            print_retry_delay_ms: 200,
            handshake_timeout_ms: 5000,
            jwt: JwtConfig::for_testing(),
            log_level: "info".into(),
            log_json: false,
            environment: "development".into(),
        }
    }

    /// 日志目录
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    pub fn print_retry_delay(&self) -> Duration {
        Duration::from_millis(self.print_retry_delay_ms)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.handshake_timeout_ms)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
