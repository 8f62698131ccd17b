//! 消息总线核心实现

use std::sync::Arc;

use dashmap::DashMap;
use shared::message::{BusMessage, MAX_FRAME_LEN};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::transport::MemoryTransport;
use super::{ConnectedClient, PublishError};

/// Default capacity of the broadcast buffer
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// 消息总线 - 进程内广播
///
/// Clone 共享同一个发送端、关闭令牌和订阅者登记表。
#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<BusMessage>,
    shutdown_token: CancellationToken,
    /// 中继订阅者 (subscriber id -> 信息)
    pub(crate) clients: Arc<DashMap<String, ConnectedClient>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// 创建指定容量的消息总线
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_shutdown_token(capacity, CancellationToken::new())
    }

    /// 使用外部关闭令牌 (跟随服务器生命周期)
    pub fn with_shutdown_token(capacity: usize, shutdown_token: CancellationToken) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            shutdown_token,
            clients: Arc::new(DashMap::new()),
        }
    }

    /// 发布消息给当前所有订阅者
    ///
    /// 返回收到消息的订阅者数量。没有订阅者不是错误。
    /// 编码后超过 [`MAX_FRAME_LEN`] 的消息在这里拒绝，不会进入中继。
    pub fn publish(&self, msg: BusMessage) -> Result<usize, PublishError> {
        if self.shutdown_token.is_cancelled() {
            return Err(PublishError::Unavailable("message bus is shut down".into()));
        }

        let size = serde_json::to_vec(&msg)?.len();
        if size > MAX_FRAME_LEN {
            tracing::warn!(
                channel = %msg.channel,
                event = %msg.event,
                size,
                "Message exceeds frame limit, rejected"
            );
            return Err(PublishError::TooLarge {
                size,
                limit: MAX_FRAME_LEN,
            });
        }

        match self.tx.send(msg) {
            Ok(receivers) => Ok(receivers),
            Err(broadcast::error::SendError(msg)) => {
                tracing::debug!(
                    channel = %msg.channel,
                    event = %msg.event,
                    "No active subscribers, message dropped"
                );
                Ok(0)
            }
        }
    }

    /// 订阅单个频道
    pub fn subscribe(&self, channel: impl Into<String>) -> ChannelSubscription {
        ChannelSubscription {
            channel: channel.into(),
            rx: self.tx.subscribe(),
            shutdown_token: self.shutdown_token.clone(),
        }
    }

    /// 获取内存传输层 (同进程通信)
    pub fn memory_transport(&self, channel: impl Into<String>) -> MemoryTransport {
        MemoryTransport::new(self.clone(), self.subscribe(channel))
    }

    /// 获取关闭令牌 (用于监控关闭信号)
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown_token
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown_token.is_cancelled()
    }

    /// 获取已连接的中继订阅者，按连接时间排序
    pub fn get_connected_clients(&self) -> Vec<ConnectedClient> {
        let mut clients: Vec<ConnectedClient> =
            self.clients.iter().map(|entry| entry.value().clone()).collect();
        clients.sort_by_key(|c| c.connected_at);
        clients
    }

    /// 关闭消息总线
    ///
    /// 之后的 publish 返回 [`PublishError::Unavailable`]，订阅者和中继连接随之结束。
    pub fn shutdown(&self) {
        tracing::info!("Shutting down message bus");
        self.shutdown_token.cancel();
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

/// 单频道订阅
///
/// 只产出目标频道的消息。落后时跳过丢失的消息并继续。
#[derive(Debug)]
pub struct ChannelSubscription {
    channel: String,
    rx: broadcast::Receiver<BusMessage>,
    shutdown_token: CancellationToken,
}

impl ChannelSubscription {
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// 等待下一条本频道消息；总线关闭时返回 `None`
    pub async fn recv(&mut self) -> Option<BusMessage> {
        loop {
            let result = tokio::select! {
                biased;
                _ = self.shutdown_token.cancelled() => return None,
                result = self.rx.recv() => result,
            };

            match result {
                Ok(msg) if msg.is_for(&self.channel) => return Some(msg),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        channel = %self.channel,
                        dropped_messages = n,
                        "Subscriber lagged behind, messages dropped"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
