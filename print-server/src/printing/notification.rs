//! Print notification construction

use serde_json::Value;
use shared::message::{
    EVENT_PRINT_ORDER, EVENT_PRINT_ORDER_ITEMS, OrderItemsPrintNotification,
    OrderPrintNotification,
};
use shared::models::{OrderItemSnapshot, OrderSnapshot, PrinterRef};

use super::channel::channel_for;

/// 一次打印请求的不可变快照
///
/// 构造时读取一次时钟；之后只能读取、序列化。
#[derive(Debug, Clone, PartialEq)]
pub enum PrintNotification {
    /// 整单打印 (`print.order`)
    Order(OrderPrintNotification),
    /// 部分菜品打印 (`print.order.items`)
    OrderItems(OrderItemsPrintNotification),
}

impl PrintNotification {
    pub fn order(order: OrderSnapshot, printer: PrinterRef) -> Self {
        tracing::debug!(
            order_id = order.id,
            printer_id = printer.id,
            printer_name = %printer.name,
            "Building order print notification"
        );
        Self::Order(OrderPrintNotification::new(order, printer))
    }

    pub fn order_items(
        order_number: Option<i64>,
        items: Vec<OrderItemSnapshot>,
        printer: PrinterRef,
    ) -> Self {
        tracing::debug!(
            order_number = ?order_number,
            item_count = items.len(),
            printer_id = printer.id,
            printer_name = %printer.name,
            "Building order items print notification"
        );
        Self::OrderItems(OrderItemsPrintNotification::new(order_number, items, printer))
    }

    /// Event name on the bus
    pub fn event(&self) -> &'static str {
        match self {
            Self::Order(_) => EVENT_PRINT_ORDER,
            Self::OrderItems(_) => EVENT_PRINT_ORDER_ITEMS,
        }
    }

    pub fn printer(&self) -> &PrinterRef {
        match self {
            Self::Order(n) => n.printer(),
            Self::OrderItems(n) => n.printer(),
        }
    }

    pub fn channel(&self) -> String {
        channel_for(self.printer())
    }

    /// Number of item snapshots carried (whole-order prints carry none)
    pub fn item_count(&self) -> usize {
        match self {
            Self::Order(_) => 0,
            Self::OrderItems(n) => n.order_items().len(),
        }
    }

    pub fn to_payload(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Order(n) => serde_json::to_value(n),
            Self::OrderItems(n) => serde_json::to_value(n),
        }
    }
}
