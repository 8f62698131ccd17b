//! Transport 传输层抽象
//!
//! ```text
//!         ┌────────────────────┐
//!         │   Transport Trait  │
//!         └────────┬───────────┘
//!                  │
//!          ┌───────┴────────┐
//!          ▼                ▼
//!    TcpTransport    MemoryTransport
//!    (中继连接)       (同进程订阅)
//! ```
//!
//! # 帧格式
//!
//! ```text
//! [kind: u8][request_id: 16 bytes][len: u32 LE][body: len bytes JSON]
//! ```

mod memory;
mod tcp;

pub use memory::MemoryTransport;
pub use tcp::TcpTransport;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use shared::message::{BusMessage, FrameKind, MAX_FRAME_LEN};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

use crate::utils::AppError;

/// 帧头长度: kind + request_id + len
const HEADER_LEN: usize = 1 + 16 + 4;

/// 一帧线上数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub request_id: Uuid,
    pub body: Vec<u8>,
}

impl Frame {
    /// 以 JSON 编码任意帧体
    pub fn encode<T: Serialize>(
        kind: FrameKind,
        request_id: Uuid,
        body: &T,
    ) -> Result<Self, AppError> {
        let body = serde_json::to_vec(body)
            .map_err(|e| AppError::invalid(format!("Failed to encode {kind} frame: {e}")))?;
        Ok(Self {
            kind,
            request_id,
            body,
        })
    }

    /// 广播消息帧，request_id 沿用消息自身的
    pub fn message(msg: &BusMessage) -> Result<Self, AppError> {
        Self::encode(FrameKind::Message, msg.request_id, msg)
    }

    /// 解析帧体
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, AppError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| AppError::invalid(format!("Invalid {} frame body: {}", self.kind, e)))
    }

    /// 解析为广播消息，类型不符时报错
    pub fn into_message(self) -> Result<BusMessage, AppError> {
        if self.kind != FrameKind::Message {
            return Err(AppError::invalid(format!(
                "Expected message frame, got {}",
                self.kind
            )));
        }
        self.decode()
    }
}

/// Transport 传输层特征
///
/// 关闭连接后的读取返回 `ClientDisconnected`。
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// 读取一帧
    async fn read_frame(&self) -> Result<Frame, AppError>;

    /// 写入一帧
    async fn write_frame(&self, frame: &Frame) -> Result<(), AppError>;

    /// 关闭传输连接
    async fn close(&self) -> Result<(), AppError>;

    /// 获取对端地址
    fn peer_addr(&self) -> Option<String> {
        None
    }

    /// 读取一条广播消息
    async fn read_message(&self) -> Result<BusMessage, AppError> {
        self.read_frame().await?.into_message()
    }

    /// 写入一条广播消息
    async fn write_message(&self, msg: &BusMessage) -> Result<(), AppError> {
        self.write_frame(&Frame::message(msg)?).await
    }
}

// ========== 辅助函数 ==========

/// 从异步流中读取一帧
pub(crate) async fn read_from_stream<R: AsyncReadExt + Unpin>(
    reader: &mut R,
) -> Result<Frame, AppError> {
    let mut header = [0u8; HEADER_LEN];
    match reader.read_exact(&mut header).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(AppError::client_disconnected());
        }
        Err(e) => return Err(AppError::internal(format!("Read header failed: {}", e))),
    }

    let kind = FrameKind::try_from(header[0])
        .map_err(|_| AppError::invalid(format!("Invalid frame kind: {}", header[0])))?;

    let mut uuid_buf = [0u8; 16];
    uuid_buf.copy_from_slice(&header[1..17]);
    let request_id = Uuid::from_bytes(uuid_buf);

    let mut len_buf = [0u8; 4];
    len_buf.copy_from_slice(&header[17..HEADER_LEN]);
    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        return Err(AppError::invalid(format!(
            "Frame body of {len} bytes exceeds limit of {MAX_FRAME_LEN}"
        )));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            AppError::client_disconnected()
        } else {
            AppError::internal(format!("Read body failed: {}", e))
        }
    })?;

    Ok(Frame {
        kind,
        request_id,
        body,
    })
}

/// 向异步流写入一帧
pub(crate) async fn write_to_stream<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    frame: &Frame,
) -> Result<(), AppError> {
    if frame.body.len() > MAX_FRAME_LEN {
        return Err(AppError::invalid(format!(
            "Frame body of {} bytes exceeds limit of {MAX_FRAME_LEN}",
            frame.body.len()
        )));
    }

    let mut data = Vec::with_capacity(HEADER_LEN + frame.body.len());
    data.push(frame.kind as u8);
    data.extend_from_slice(frame.request_id.as_bytes());
    data.extend_from_slice(&(frame.body.len() as u32).to_le_bytes());
    data.extend_from_slice(&frame.body);

    writer
        .write_all(&data)
        .await
        .map_err(|e| AppError::internal(format!("Write failed: {}", e)))?;
    writer
        .flush()
        .await
        .map_err(|e| AppError::internal(format!("Flush failed: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::ErrorCode;
    use shared::message::SubscribeRequest;

    #[tokio::test]
    async fn test_frame_layout() {
        let request_id = Uuid::new_v4();
        let frame =
            Frame::encode(FrameKind::Subscribe, request_id, &SubscribeRequest::new("c")).unwrap();

        let mut buf = Vec::new();
        write_to_stream(&mut buf, &frame).await.unwrap();

        assert_eq!(buf[0], 0);
        assert_eq!(&buf[1..17], request_id.as_bytes());
        let len = u32::from_le_bytes([buf[17], buf[18], buf[19], buf[20]]) as usize;
        assert_eq!(len, buf.len() - HEADER_LEN);

        let decoded = read_from_stream(&mut buf.as_slice()).await.unwrap();
        assert_eq!(decoded, frame);
        let req: SubscribeRequest = decoded.decode().unwrap();
        assert_eq!(req.channel, "c");
    }

    #[tokio::test]
    async fn test_rejects_oversize_frame() {
        let mut buf = vec![FrameKind::Message as u8];
        buf.extend_from_slice(Uuid::nil().as_bytes());
        buf.extend_from_slice(&((MAX_FRAME_LEN as u32) + 1).to_le_bytes());

        let err = read_from_stream(&mut buf.as_slice()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn test_rejects_unknown_kind() {
        let mut buf = vec![9u8];
        buf.extend_from_slice(&[0u8; 20]);
        assert!(read_from_stream(&mut buf.as_slice()).await.is_err());
    }

    #[tokio::test]
    async fn test_eof_is_disconnect() {
        let err = read_from_stream(&mut [1u8, 2].as_slice()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ClientDisconnected);
    }

    #[test]
    fn test_subscribe_frame_is_not_a_message() {
        let frame =
            Frame::encode(FrameKind::Subscribe, Uuid::nil(), &SubscribeRequest::new("c")).unwrap();
        assert!(frame.into_message().is_err());
    }
}
