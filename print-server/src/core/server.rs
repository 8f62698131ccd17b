//! Server Implementation
//!
//! HTTP API 和 TCP 中继的启动与关闭

use tokio::net::TcpListener;

use crate::api;
use crate::core::{Config, ServerState};
use crate::message::RelayServer;
use crate::utils::{AppError, AppResult};

/// HTTP Server + print relay
pub struct Server {
    config: Config,
    state: ServerState,
}

impl Server {
    pub fn with_state(config: Config, state: ServerState) -> Self {
        Self { config, state }
    }

    /// 运行直到关闭令牌被取消
    pub async fn run(&self) -> AppResult<()> {
        let shutdown_token = self.state.shutdown_token().clone();

        // Print relay (TCP)
        let relay = RelayServer::bind(
            self.state.message_bus().clone(),
            &format!("0.0.0.0:{}", self.config.message_tcp_port),
            self.config.handshake_timeout(),
        )
        .await?;
        let relay_handle = tokio::spawn(async move {
            if let Err(e) = relay.run().await {
                tracing::error!("Print relay failed: {}", e);
            }
        });

        // HTTP API
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], self.config.http_port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
        tracing::info!("🖨️  Print server HTTP API listening on {}", addr);

        let app = api::build_app(self.state.clone());
        let graceful = shutdown_token.clone();
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async move { graceful.cancelled().await })
            .await
            .map_err(|e| AppError::internal(format!("HTTP server error: {}", e)));

        // HTTP 异常退出时也要停止中继
        self.state.message_bus().shutdown();
        let _ = relay_handle.await;
        tracing::info!("Print server stopped");

        served
    }
}
