//! Store Model

use serde::{Deserialize, Serialize};

/// Store entity
///
/// `uuid` is the stable public identifier; broadcast channels are derived
/// from it, never from the numeric id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Store {
    pub id: i64,
    pub uuid: String,
    #[serde(default)]
    pub name: String,
}
