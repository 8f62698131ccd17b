//! Data models
//!
//! Shared between print-server and print clients (via broadcast payloads).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` (SQLite INTEGER PRIMARY KEY).

pub mod order;
pub mod printer;
pub mod store;

// Re-exports
pub use order::*;
pub use printer::*;
pub use store::*;
