//! Memory 传输层实现 (同进程通信)

use std::sync::Arc;

use async_trait::async_trait;
use shared::message::FrameKind;
use tokio::sync::Mutex;

use super::{Frame, Transport};
use crate::message::{ChannelSubscription, MessageBus};
use crate::utils::AppError;

/// In-process transport bound to a single channel
///
/// 读取本频道的广播消息；写入的消息帧直接发布到总线。
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    bus: MessageBus,
    subscription: Arc<Mutex<ChannelSubscription>>,
}

impl MemoryTransport {
    pub fn new(bus: MessageBus, subscription: ChannelSubscription) -> Self {
        Self {
            bus,
            subscription: Arc::new(Mutex::new(subscription)),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn read_frame(&self) -> Result<Frame, AppError> {
        let mut subscription = self.subscription.lock().await;
        match subscription.recv().await {
            Some(msg) => Frame::message(&msg),
            None => Err(AppError::client_disconnected()),
        }
    }

    async fn write_frame(&self, frame: &Frame) -> Result<(), AppError> {
        if frame.kind != FrameKind::Message {
            return Err(AppError::invalid(format!(
                "Memory transport only carries message frames, got {}",
                frame.kind
            )));
        }
        let msg = frame.clone().into_message()?;
        self.bus.publish(msg)?;
        Ok(())
    }

    async fn close(&self) -> Result<(), AppError> {
        Ok(())
    }

    fn peer_addr(&self) -> Option<String> {
        Some("memory".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared::message::BusMessage;

    #[tokio::test]
    async fn test_memory_round_trip_on_channel() {
        let bus = MessageBus::new();
        let transport = bus.memory_transport("print-orders-x");

        bus.publish(BusMessage::new("print-orders-y", "print.order", json!({})))
            .unwrap();
        transport
            .write_message(&BusMessage::new("print-orders-x", "print.order", json!({"k": 1})))
            .await
            .unwrap();

        let msg = transport.read_message().await.unwrap();
        assert_eq!(msg.channel, "print-orders-x");
        assert_eq!(msg.payload["k"], 1);
    }

    #[tokio::test]
    async fn test_read_after_shutdown_is_disconnect() {
        let bus = MessageBus::new();
        let transport = bus.memory_transport("c");
        bus.shutdown();
        let err = transport.read_frame().await.unwrap_err();
        assert_eq!(err.code, shared::ErrorCode::ClientDisconnected);
    }
}
