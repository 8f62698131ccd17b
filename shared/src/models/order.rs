//! Order Model
//!
//! Read-only snapshots of orders and order items, as captured at print time.

use serde::{Deserialize, Serialize};

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

/// Order summary snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderSnapshot {
    pub id: i64,
    /// External display number (not the primary key)
    pub order_number: Option<i64>,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    pub subtotal: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub tax: f64,
    pub total: f64,
    /// Creation timestamp (millis)
    pub created_at: i64,
}

/// Selected option / addon on an order item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ItemOption {
    #[serde(skip)]
    pub order_item_id: i64,
    pub name: String,
    pub price: f64,
}

/// Sub-item of a combo line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ComboItem {
    #[serde(skip)]
    pub order_item_id: i64,
    pub name: String,
    pub quantity: i32,
}

/// Order item snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItemSnapshot {
    pub id: i64,
    pub order_id: i64,
    pub product_variant_name: String,
    pub quantity: i32,
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    // -- Relations (populated by application code, skipped by FromRow) --
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub options: Vec<ItemOption>,
    #[cfg_attr(feature = "db", sqlx(skip))]
    #[serde(default)]
    pub combo_items: Vec<ComboItem>,
}

impl OrderItemSnapshot {
    /// Whether this line is a combo with sub-items
    pub fn is_combo(&self) -> bool {
        !self.combo_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_screaming_snake() {
        let json = serde_json::to_string(&OrderStatus::Preparing).unwrap();
        assert_eq!(json, "\"PREPARING\"");
    }

    #[test]
    fn test_item_option_hides_parent_id() {
        let opt = ItemOption {
            order_item_id: 42,
            name: "Extra cheese".into(),
            price: 1.5,
        };
        let json = serde_json::to_value(&opt).unwrap();
        assert!(json.get("order_item_id").is_none());
        assert_eq!(json["name"], "Extra cheese");
        assert_eq!(json["price"], 1.5);
    }
}
