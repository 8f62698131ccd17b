//! Publish port between the dispatcher and the broadcast transport

use async_trait::async_trait;
use serde_json::Value;
use shared::message::BusMessage;

pub use crate::message::PublishError;
use crate::message::MessageBus;

/// 打印通知的发布端口
///
/// 返回即表示消息已交给传输层，不代表已打印。
#[async_trait]
pub trait PrintPublisher: Send + Sync {
    async fn publish(&self, channel: &str, event: &str, payload: Value)
    -> Result<(), PublishError>;
}

#[async_trait]
impl PrintPublisher for MessageBus {
    async fn publish(
        &self,
        channel: &str,
        event: &str,
        payload: Value,
    ) -> Result<(), PublishError> {
        let msg = BusMessage::new(channel, event, payload);
        let request_id = msg.request_id;
        let receivers = MessageBus::publish(self, msg)?;

        tracing::info!(
            channel = %channel,
            event = %event,
            request_id = %request_id,
            receivers,
            "Print notification published"
        );
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_bus_publisher_delivers_to_channel() {
        let bus = MessageBus::new();
        let mut sub = bus.subscribe("print-orders-abc");

        PrintPublisher::publish(&bus, "print-orders-abc", "print.order", json!({"x": 1}))
            .await
            .unwrap();

        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.event, "print.order");
        assert_eq!(msg.payload, json!({"x": 1}));
    }

    #[tokio::test]
    async fn test_bus_publisher_unavailable_after_shutdown() {
        let bus = MessageBus::new();
        bus.shutdown();
        let result = PrintPublisher::publish(&bus, "c", "e", json!({})).await;
        assert!(matches!(result, Err(PublishError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_bus_publisher_rejects_oversize_payload() {
        let bus = MessageBus::new();
        let _sub = bus.subscribe("c");
        let payload = json!({ "note": "x".repeat(shared::message::MAX_FRAME_LEN) });
        let result = PrintPublisher::publish(&bus, "c", "print.order", payload).await;
        assert!(matches!(result, Err(PublishError::TooLarge { .. })));
    }
}
