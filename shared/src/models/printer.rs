//! Printer Model

use serde::{Deserialize, Serialize};

use super::store::Store;

/// Printer row (as stored)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Printer {
    pub id: i64,
    pub name: String,
    /// Owning store; printers without one cannot be addressed
    pub store_id: Option<i64>,
}

/// Printer with its owning store resolved
///
/// This is the `printer` object carried by every print notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterRef {
    pub id: i64,
    pub name: String,
    pub store: Store,
}

impl PrinterRef {
    pub fn new(id: i64, name: impl Into<String>, store: Store) -> Self {
        Self {
            id,
            name: name.into(),
            store,
        }
    }
}
