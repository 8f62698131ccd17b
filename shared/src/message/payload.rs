//! Print notification payloads
//!
//! Both notifications are snapshots: every field is captured when the value
//! is constructed and there is no way to change it afterwards. Subscribers
//! deserialize the same types from [`BusMessage::payload`](super::BusMessage).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{OrderItemSnapshot, OrderSnapshot, PrinterRef};

/// Event name for a whole-order print
pub const EVENT_PRINT_ORDER: &str = "print.order";

/// Event name for an item-subset print
pub const EVENT_PRINT_ORDER_ITEMS: &str = "print.order.items";

/// Discriminator carried inside `print.order.items` payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemsEventType {
    PrintOrderItems,
}

/// `print.order` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPrintNotification {
    order: OrderSnapshot,
    printer: PrinterRef,
    timestamp: DateTime<Utc>,
}

impl OrderPrintNotification {
    /// Capture a snapshot, reading the clock once
    pub fn new(order: OrderSnapshot, printer: PrinterRef) -> Self {
        Self {
            order,
            printer,
            timestamp: Utc::now(),
        }
    }

    pub fn order(&self) -> &OrderSnapshot {
        &self.order
    }

    pub fn printer(&self) -> &PrinterRef {
        &self.printer
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// `print.order.items` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItemsPrintNotification {
    order_number: Option<i64>,
    order_items: Vec<OrderItemSnapshot>,
    printer: PrinterRef,
    timestamp: DateTime<Utc>,
    event_type: ItemsEventType,
}

impl OrderItemsPrintNotification {
    /// Capture a snapshot, reading the clock once
    ///
    /// An empty `items` list is valid and produces an empty `order_items`.
    pub fn new(
        order_number: Option<i64>,
        items: Vec<OrderItemSnapshot>,
        printer: PrinterRef,
    ) -> Self {
        Self {
            order_number,
            order_items: items,
            printer,
            timestamp: Utc::now(),
            event_type: ItemsEventType::PrintOrderItems,
        }
    }

    pub fn order_number(&self) -> Option<i64> {
        self.order_number
    }

    pub fn order_items(&self) -> &[OrderItemSnapshot] {
        &self.order_items
    }

    pub fn printer(&self) -> &PrinterRef {
        &self.printer
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn event_type(&self) -> ItemsEventType {
        self.event_type
    }
}
