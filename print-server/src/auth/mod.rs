//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 按请求计算的用户上下文 (axum 提取器)
//! - [`permissions`] - 权限常量

pub mod extractor;
pub mod jwt;
pub mod permissions;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use permissions::{PERM_ORDERS_PRINT, PERM_SETTINGS_MANAGE};
