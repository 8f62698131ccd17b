//! 消息总线消息类型定义
//!
//! 这些类型在 print-server 和打印客户端之间共享，用于
//! 进程内（内存）和网络（TCP）通信。

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// 协议版本号
pub const PROTOCOL_VERSION: u16 = 1;

/// Largest frame body accepted on the wire (4 MiB)
pub const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

/// Relay wire frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// 客户端订阅请求 (body: [`SubscribeRequest`])
    Subscribe = 0,
    /// 广播消息 (body: [`BusMessage`])
    Message = 1,
    /// 订阅确认 (body: [`SubscribeAck`])
    SubscribeAck = 2,
}

impl TryFrom<u8> for FrameKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(FrameKind::Subscribe),
            1 => Ok(FrameKind::Message),
            2 => Ok(FrameKind::SubscribeAck),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameKind::Subscribe => write!(f, "subscribe"),
            FrameKind::Message => write!(f, "message"),
            FrameKind::SubscribeAck => write!(f, "subscribe_ack"),
        }
    }
}

/// 订阅请求 - 客户端连接后发送的第一帧
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub channel: String,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u16,
    /// Free-form client label (e.g. "kitchen-relay-1")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
}

fn default_protocol_version() -> u16 {
    PROTOCOL_VERSION
}

impl SubscribeRequest {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            protocol_version: PROTOCOL_VERSION,
            client_name: None,
        }
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = Some(name.into());
        self
    }
}

/// 订阅确认
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeAck {
    pub subscriber_id: String,
    pub channel: String,
    pub protocol_version: u16,
}

/// 消息总线消息体
///
/// One broadcast on one channel. `payload` is the event's JSON object as
/// the subscriber will receive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusMessage {
    pub request_id: Uuid,
    pub channel: String,
    pub event: String,
    pub payload: serde_json::Value,
    /// Handoff time (millis)
    pub published_at: i64,
}

impl BusMessage {
    pub fn new(
        channel: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            channel: channel.into(),
            event: event.into(),
            payload,
            published_at: crate::util::now_millis(),
        }
    }

    /// 是否属于指定频道
    pub fn is_for(&self, channel: &str) -> bool {
        self.channel == channel
    }

    /// 解析载荷为指定类型
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.payload)
    }

    /// 序列化为二进制
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// 从二进制解析
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_kind_try_from() {
        assert_eq!(FrameKind::try_from(0), Ok(FrameKind::Subscribe));
        assert_eq!(FrameKind::try_from(1), Ok(FrameKind::Message));
        assert_eq!(FrameKind::try_from(2), Ok(FrameKind::SubscribeAck));
        assert!(FrameKind::try_from(9).is_err());

        for kind in [FrameKind::Subscribe, FrameKind::Message, FrameKind::SubscribeAck] {
            assert_eq!(FrameKind::try_from(kind as u8), Ok(kind));
        }
    }

    #[test]
    fn test_bus_message_channel_match() {
        let msg = BusMessage::new("print-orders-abc", "print.order", json!({}));
        assert!(msg.is_for("print-orders-abc"));
        assert!(!msg.is_for("print-orders-xyz"));
    }

    #[test]
    fn test_bus_message_bytes() {
        let msg = BusMessage::new("print-orders-abc", "print.order", json!({"k": 1}));
        let bytes = msg.to_bytes().unwrap();
        let parsed = BusMessage::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn test_subscribe_request_defaults_version() {
        let req: SubscribeRequest =
            serde_json::from_str(r#"{"channel":"print-orders-abc"}"#).unwrap();
        assert_eq!(req.protocol_version, PROTOCOL_VERSION);
        assert!(req.client_name.is_none());
    }
}
