//! Print API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use crate::auth::{CurrentUser, PERM_ORDERS_PRINT, PERM_SETTINGS_MANAGE};
use crate::core::ServerState;
use crate::message::ConnectedClient;
use crate::printing::DispatchReport;
use crate::utils::{ApiResponse, AppError, AppResult, ok};

/// 单次请求允许的最大菜品数
const MAX_ITEMS_PER_REQUEST: usize = 500;

#[derive(Debug, Deserialize)]
pub struct PrintOrderRequest {
    pub printer_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PrintOrderItemsRequest {
    #[serde(default)]
    pub order_number: Option<i64>,
    #[serde(default)]
    pub item_ids: Vec<i64>,
    pub printer_id: i64,
}

/// POST /api/print/orders/{order_id} - 整单打印
pub async fn print_order(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(order_id): Path<i64>,
    Json(req): Json<PrintOrderRequest>,
) -> AppResult<ApiResponse<DispatchReport>> {
    user.require(PERM_ORDERS_PRINT)?;

    tracing::info!(
        user_id = %user.id,
        order_id,
        printer_id = req.printer_id,
        "Print order requested"
    );

    let report = state
        .dispatcher()
        .print_order(order_id, req.printer_id)
        .await?;
    Ok(ok(report))
}

/// POST /api/print/order-items - 部分菜品打印
pub async fn print_order_items(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(req): Json<PrintOrderItemsRequest>,
) -> AppResult<ApiResponse<DispatchReport>> {
    user.require(PERM_ORDERS_PRINT)?;

    if req.item_ids.len() > MAX_ITEMS_PER_REQUEST {
        return Err(AppError::validation(format!(
            "At most {} items can be printed per request",
            MAX_ITEMS_PER_REQUEST
        )));
    }

    tracing::info!(
        user_id = %user.id,
        order_number = ?req.order_number,
        item_count = req.item_ids.len(),
        printer_id = req.printer_id,
        "Print order items requested"
    );

    let report = state
        .dispatcher()
        .print_order_items(req.order_number, &req.item_ids, req.printer_id)
        .await?;
    Ok(ok(report))
}

/// GET /api/print/subscribers - 当前中继订阅者
pub async fn subscribers(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<ApiResponse<Vec<ConnectedClient>>> {
    user.require(PERM_SETTINGS_MANAGE)?;
    Ok(ok(state.message_bus().get_connected_clients()))
}
