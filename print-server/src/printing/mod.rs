//! 打印通知模块
//!
//! 订单或部分菜品需要打印时：
//!
//! ```text
//! PrintDispatcher ──▶ 读取快照 (db::repository)
//!        │
//!        ├──▶ PrintNotification  (notification: 构造不可变快照)
//!        ├──▶ channel_for        (channel: print-orders-<storeUuid>)
//!        └──▶ PrintPublisher     (publisher: 交给广播总线)
//! ```
//!
//! 发布是 fire-and-forget：不等待打印客户端确认。

pub mod channel;
pub mod dispatcher;
pub mod notification;
pub mod publisher;

pub use channel::{CHANNEL_PREFIX, channel_for};
pub use dispatcher::{DispatchReport, PrintDispatcher, PrintError};
pub use notification::PrintNotification;
pub use publisher::PrintPublisher;
