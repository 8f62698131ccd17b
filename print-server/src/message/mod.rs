//! 消息总线模块
//!
//! 打印通知的广播通道：
//!
//! ```text
//! PrintDispatcher ──▶ MessageBus::publish ──▶ broadcast::Sender<BusMessage>
//!                                                   │
//!                         ┌─────────────────────────┤
//!                         ▼                         ▼
//!                 ChannelSubscription         TCP relay (tcp_server)
//!                 (同进程订阅者)              ──▶ 打印客户端
//! ```
//!
//! 广播是实时的：没有订阅者时消息直接丢弃，不排队、不确认。

pub mod bus;
pub mod tcp_server;
pub mod transport;

pub use bus::{ChannelSubscription, MessageBus};
pub use tcp_server::RelayServer;
pub use transport::{Frame, MemoryTransport, TcpTransport, Transport};

use serde::Serialize;
use thiserror::Error;

use crate::utils::{AppError, ErrorCode};

/// 发布失败
#[derive(Debug, Error)]
pub enum PublishError {
    /// 总线已关闭或不可达
    #[error("message bus unavailable: {0}")]
    Unavailable(String),

    /// 载荷无法序列化
    #[error("failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),

    /// 编码后超过单帧上限，中继无法发送
    #[error("payload of {size} bytes exceeds frame limit of {limit}")]
    TooLarge { size: usize, limit: usize },
}

impl PublishError {
    /// 重试没有意义的错误 (载荷本身有问题)
    pub fn is_retryable(&self) -> bool {
        matches!(self, PublishError::Unavailable(_))
    }
}

impl From<PublishError> for AppError {
    fn from(err: PublishError) -> Self {
        match err {
            PublishError::Unavailable(msg) => {
                AppError::with_message(ErrorCode::PrinterNotAvailable, msg)
            }
            PublishError::Encode(e) => AppError::with_message(ErrorCode::PrintFailed, e.to_string()),
            PublishError::TooLarge { size, limit } => AppError::with_message(
                ErrorCode::PrintFailed,
                format!("Payload of {size} bytes exceeds frame limit of {limit}"),
            )
            .with_detail("size", size)
            .with_detail("limit", limit),
        }
    }
}

/// 已连接的中继订阅者
#[derive(Debug, Clone, Serialize)]
pub struct ConnectedClient {
    pub id: String,
    pub channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addr: Option<String>,
    /// 连接时间 (millis)
    pub connected_at: i64,
}
