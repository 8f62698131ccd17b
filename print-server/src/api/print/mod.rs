//! Print API Module
//!
//! | 路径 | 方法 | 权限 |
//! |------|------|------|
//! | /api/print/orders/{order_id} | POST | orders:print |
//! | /api/print/order-items | POST | orders:print |
//! | /api/print/subscribers | GET | settings:manage |

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/print", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/orders/{order_id}", post(handler::print_order))
        .route("/order-items", post(handler::print_order_items))
        .route("/subscribers", get(handler::subscribers))
}
