//! TCP 中继服务器
//!
//! 打印客户端通过 TCP 连接后：
//! 1. 在握手超时内发送订阅帧 (`SubscribeRequest`)
//! 2. 收到订阅确认 (`SubscribeAck`)
//! 3. 持续接收该频道的广播，直到断开或服务器关闭

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use shared::message::{FrameKind, PROTOCOL_VERSION, SubscribeAck, SubscribeRequest};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::bus::MessageBus;
use super::transport::{Frame, TcpTransport, Transport};
use super::{ChannelSubscription, ConnectedClient};
use crate::utils::{AppError, ErrorCode};

/// 中继服务器 - 已绑定端口，调用 [`RelayServer::run`] 开始接受连接
pub struct RelayServer {
    bus: MessageBus,
    listener: TcpListener,
    handshake_timeout: Duration,
}

impl RelayServer {
    /// 绑定监听地址 (端口 0 表示随机端口)
    pub async fn bind(
        bus: MessageBus,
        addr: &str,
        handshake_timeout: Duration,
    ) -> Result<Self, AppError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

        Ok(Self {
            bus,
            listener,
            handshake_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, AppError> {
        self.listener
            .local_addr()
            .map_err(|e| AppError::internal(format!("Failed to read local address: {}", e)))
    }

    /// Accept loop, runs until the bus shuts down
    pub async fn run(self) -> Result<(), AppError> {
        if let Ok(addr) = self.listener.local_addr() {
            tracing::info!("Print relay listening on {}", addr);
        }

        let shutdown_token = self.bus.shutdown_token().clone();
        loop {
            tokio::select! {
                _ = shutdown_token.cancelled() => {
                    tracing::info!("Print relay shutting down");
                    break;
                }

                result = self.listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            tracing::debug!("Relay client connected: {}", addr);
                            self.spawn_client_handler(stream, addr);
                        }
                        Err(e) => {
                            tracing::error!("Failed to accept connection: {}", e);
                        }
                    }
                }
            }
        }

        Ok(())
    }

    fn spawn_client_handler(&self, stream: TcpStream, addr: SocketAddr) {
        let bus = self.bus.clone();
        let handshake_timeout = self.handshake_timeout;

        tokio::spawn(async move {
            if let Err(e) = handle_client_connection(stream, addr, bus, handshake_timeout).await {
                tracing::debug!("Relay client {} handler finished: {}", addr, e);
            }
        });
    }
}

/// Handle a single subscriber connection
async fn handle_client_connection(
    stream: TcpStream,
    addr: SocketAddr,
    bus: MessageBus,
    handshake_timeout: Duration,
) -> Result<(), AppError> {
    let transport: Arc<dyn Transport> = Arc::new(TcpTransport::from_stream(stream));

    let request = match tokio::time::timeout(handshake_timeout, transport.read_frame()).await {
        Ok(frame) => frame?,
        Err(_) => {
            tracing::warn!(
                "Relay client {} did not subscribe within {:?}",
                addr,
                handshake_timeout
            );
            let _ = transport.close().await;
            return Err(AppError::new(ErrorCode::TimeoutError));
        }
    };

    let subscriber_id = Uuid::new_v4().to_string();
    let handshake = perform_handshake(&transport, &bus, request, &subscriber_id).await;
    let (subscription, request) = match handshake {
        Ok(ok) => ok,
        Err(e) => {
            let _ = transport.close().await;
            return Err(e);
        }
    };

    bus.clients.insert(
        subscriber_id.clone(),
        ConnectedClient {
            id: subscriber_id.clone(),
            channel: request.channel.clone(),
            client_name: request.client_name.clone(),
            addr: transport.peer_addr(),
            connected_at: shared::util::now_millis(),
        },
    );
    tracing::info!(
        subscriber_id = %subscriber_id,
        channel = %request.channel,
        client_name = ?request.client_name,
        "Relay subscriber registered"
    );

    let disconnect_token = CancellationToken::new();
    let reader = spawn_disconnect_watcher(
        transport.clone(),
        subscriber_id.clone(),
        disconnect_token.clone(),
    );

    forward_channel(&transport, subscription, &subscriber_id, &disconnect_token).await;

    // Cleanup
    reader.abort();
    let _ = transport.close().await;
    bus.clients.remove(&subscriber_id);
    tracing::info!(subscriber_id = %subscriber_id, "Relay subscriber removed");

    Ok(())
}

/// Validate the subscribe frame and acknowledge it
///
/// 订阅在确认之前建立，客户端收到确认后发布的消息都不会丢。
async fn perform_handshake(
    transport: &Arc<dyn Transport>,
    bus: &MessageBus,
    frame: Frame,
    subscriber_id: &str,
) -> Result<(ChannelSubscription, SubscribeRequest), AppError> {
    if frame.kind != FrameKind::Subscribe {
        tracing::warn!("Relay client sent {} before subscribing", frame.kind);
        return Err(AppError::invalid("Expected subscribe frame"));
    }

    let request: SubscribeRequest = frame.decode()?;

    if request.protocol_version != PROTOCOL_VERSION {
        tracing::warn!(
            "Relay protocol version mismatch: expected {}, got {}",
            PROTOCOL_VERSION,
            request.protocol_version
        );
        return Err(AppError::invalid("Protocol version mismatch"));
    }

    if request.channel.trim().is_empty() {
        return Err(AppError::validation("Subscribe channel must not be empty"));
    }

    let subscription = bus.subscribe(request.channel.clone());

    let ack = SubscribeAck {
        subscriber_id: subscriber_id.to_string(),
        channel: request.channel.clone(),
        protocol_version: PROTOCOL_VERSION,
    };
    transport
        .write_frame(&Frame::encode(FrameKind::SubscribeAck, frame.request_id, &ack)?)
        .await?;

    Ok((subscription, request))
}

/// 客户端订阅后不应再发送数据；读取只用于发现断开
fn spawn_disconnect_watcher(
    transport: Arc<dyn Transport>,
    subscriber_id: String,
    disconnect_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match transport.read_frame().await {
                Ok(frame) => {
                    tracing::debug!(
                        subscriber_id = %subscriber_id,
                        kind = %frame.kind,
                        "Ignoring frame from subscriber"
                    );
                }
                Err(e) => {
                    if e.code == ErrorCode::ClientDisconnected {
                        tracing::debug!(subscriber_id = %subscriber_id, "Subscriber disconnected");
                    } else {
                        tracing::debug!(subscriber_id = %subscriber_id, "Subscriber read error: {}", e);
                    }
                    disconnect_token.cancel();
                    break;
                }
            }
        }
    })
}

async fn forward_channel(
    transport: &Arc<dyn Transport>,
    mut subscription: ChannelSubscription,
    subscriber_id: &str,
    disconnect_token: &CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            _ = disconnect_token.cancelled() => break,
            msg = subscription.recv() => msg,
        };

        let Some(msg) = msg else {
            tracing::debug!(subscriber_id = %subscriber_id, "Bus closed, forwarder stopping");
            break;
        };

        if let Err(e) = transport.write_message(&msg).await {
            // 单条消息无法成帧时跳过，连接保持
            if e.code == ErrorCode::InvalidRequest {
                tracing::warn!(
                    subscriber_id = %subscriber_id,
                    channel = %msg.channel,
                    event = %msg.event,
                    "Skipping message that cannot be framed: {}", e
                );
                continue;
            }
            tracing::debug!(subscriber_id = %subscriber_id, "Subscriber write failed: {}", e);
            break;
        }
    }
}
