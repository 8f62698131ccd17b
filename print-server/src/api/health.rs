//! 健康检查路由
//!
//! | 路径 | 方法 | 认证 |
//! |------|------|------|
//! | /health | GET | 无 |

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().route("/health", get(health))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// ok | degraded
    status: &'static str,
    version: &'static str,
    database: bool,
    message_bus: bool,
    subscribers: usize,
}

pub async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    let database = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(state.pool())
        .await
        .is_ok();
    let message_bus = !state.message_bus().is_shutdown();

    Json(HealthResponse {
        status: if database && message_bus { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
        message_bus,
        subscribers: state.message_bus().get_connected_clients().len(),
    })
}
