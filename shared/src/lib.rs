//! Shared types for the print relay
//!
//! Wire messages, domain models and the unified error system used by
//! `print-server` and by anything that subscribes to its channels.

pub mod error;
pub mod message;
pub mod models;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

// Message bus re-exports (for convenient access)
pub use message::{BusMessage, FrameKind};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
