//! Print dispatcher
//!
//! 读取快照、构造通知、解析频道并发布。每次调用相互独立，不共享可变状态。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use shared::models::PrinterRef;
use sqlx::SqlitePool;
use thiserror::Error;

use super::notification::PrintNotification;
use super::publisher::PrintPublisher;
use crate::db::repository::{RepoError, order, printer};
use crate::utils::{AppError, ErrorCode};

/// 发布失败后重试前的默认等待
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(200);

/// 单次重试：首次发布 + 1 次重试
const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Error)]
pub enum PrintError {
    #[error("Printer not found: {0}")]
    PrinterNotFound(i64),

    #[error("Printer {0} is not assigned to a store")]
    PrinterStoreMissing(i64),

    #[error("Order not found: {0}")]
    OrderNotFound(i64),

    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),

    #[error("Failed to encode notification: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type PrintResult<T> = Result<T, PrintError>;

impl From<PrintError> for AppError {
    fn from(err: PrintError) -> Self {
        match err {
            PrintError::PrinterNotFound(id) => {
                AppError::with_message(ErrorCode::PrinterNotFound, format!("Printer {} not found", id))
                    .with_detail("printer_id", id)
            }
            PrintError::PrinterStoreMissing(id) => AppError::with_message(
                ErrorCode::PrinterStoreMissing,
                format!("Printer {} is not assigned to a store", id),
            )
            .with_detail("printer_id", id),
            PrintError::OrderNotFound(id) => {
                AppError::with_message(ErrorCode::OrderNotFound, format!("Order {} not found", id))
                    .with_detail("order_id", id)
            }
            PrintError::Repo(e) => e.into(),
            PrintError::Encode(e) => AppError::with_message(ErrorCode::PrintFailed, e.to_string()),
        }
    }
}

/// 一次打印分发的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchReport {
    pub channel: String,
    pub event: String,
    /// 是否已交给传输层 (不代表已打印)
    pub delivered: bool,
    pub attempts: u32,
    pub item_count: usize,
    /// 请求中不存在的菜品 id (去重，保持请求顺序)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_item_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// 打印分发器
#[derive(Clone)]
pub struct PrintDispatcher {
    pool: SqlitePool,
    publisher: Arc<dyn PrintPublisher>,
    retry_delay: Duration,
}

impl PrintDispatcher {
    pub fn new(pool: SqlitePool, publisher: Arc<dyn PrintPublisher>) -> Self {
        Self {
            pool,
            publisher,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// 整单打印 (`print.order`)
    pub async fn print_order(&self, order_id: i64, printer_id: i64) -> PrintResult<DispatchReport> {
        let printer = self.resolve_printer(printer_id).await?;
        let order = order::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(PrintError::OrderNotFound(order_id))?;

        let notification = PrintNotification::order(order, printer);
        self.deliver(notification, Vec::new()).await
    }

    /// 部分菜品打印 (`print.order.items`)
    ///
    /// 不存在的 id 只记录在报告里；空列表同样会发布一条空的 `order_items`。
    pub async fn print_order_items(
        &self,
        order_number: Option<i64>,
        item_ids: &[i64],
        printer_id: i64,
    ) -> PrintResult<DispatchReport> {
        let printer = self.resolve_printer(printer_id).await?;

        let requested = dedup_preserving_order(item_ids);
        let items = order::find_items_by_ids(&self.pool, &requested).await?;

        let found: HashSet<i64> = items.iter().map(|i| i.id).collect();
        let missing: Vec<i64> = requested
            .iter()
            .copied()
            .filter(|id| !found.contains(id))
            .collect();

        if !missing.is_empty() {
            tracing::warn!(
                order_number = ?order_number,
                printer_id,
                requested = requested.len(),
                found = items.len(),
                missing = ?missing,
                "Some order items were not found, printing the rest"
            );
        }

        let notification = PrintNotification::order_items(order_number, items, printer);
        self.deliver(notification, missing).await
    }

    async fn resolve_printer(&self, printer_id: i64) -> PrintResult<PrinterRef> {
        let printer = printer::find_by_id(&self.pool, printer_id)
            .await?
            .ok_or(PrintError::PrinterNotFound(printer_id))?;

        let store_id = printer
            .store_id
            .ok_or(PrintError::PrinterStoreMissing(printer_id))?;
        let store = printer::find_store(&self.pool, store_id)
            .await?
            .ok_or(PrintError::PrinterStoreMissing(printer_id))?;

        Ok(PrinterRef::new(printer.id, printer.name, store))
    }

    async fn deliver(
        &self,
        notification: PrintNotification,
        missing_item_ids: Vec<i64>,
    ) -> PrintResult<DispatchReport> {
        let channel = notification.channel();
        let event = notification.event();
        let payload = notification.to_payload()?;

        let mut attempts = 0;
        let mut last_error = None;
        while attempts < MAX_ATTEMPTS {
            if attempts > 0 {
                tokio::time::sleep(self.retry_delay).await;
            }
            attempts += 1;

            match self.publisher.publish(&channel, event, payload.clone()).await {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        channel = %channel,
                        event,
                        attempt = attempts,
                        error = %e,
                        "Print notification publish failed"
                    );
                    let retryable = e.is_retryable();
                    last_error = Some(e);
                    if !retryable {
                        break;
                    }
                }
            }
        }

        let warning = last_error.map(|e| {
            tracing::warn!(
                channel = %channel,
                event,
                attempts,
                "Print notification dropped after retry"
            );
            format!("print notification not delivered: {e}")
        });

        Ok(DispatchReport {
            delivered: warning.is_none(),
            channel,
            event: event.to_string(),
            attempts,
            item_count: notification.item_count(),
            missing_item_ids,
            warning,
        })
    }
}

fn dedup_preserving_order(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
