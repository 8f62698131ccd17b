#![allow(dead_code)]

use print_server::db::DbService;
use print_server::{Config, ServerState};

/// In-memory state with store `abc-uuid`, printer 3 "Kitchen-1",
/// printer 4 without a store, order 77 (#1042) and items 5001/5002.
pub async fn seeded_state() -> ServerState {
    let db = DbService::in_memory().await.unwrap();
    sqlx::raw_sql(
        "INSERT INTO store (id, uuid, name) VALUES (1, 'abc-uuid', 'Downtown');
         INSERT INTO printer (id, name, store_id) VALUES (3, 'Kitchen-1', 1);
         INSERT INTO printer (id, name, store_id) VALUES (4, 'Bar', NULL);
         INSERT INTO orders (id, order_number, status, subtotal, total, created_at)
             VALUES (77, 1042, 'PENDING', 15.0, 15.0, 1700000000000);
         INSERT INTO order_item (id, order_id, product_variant_name, quantity, price)
             VALUES (5001, 77, 'Burger / Large', 1, 9.5);
         INSERT INTO order_item (id, order_id, product_variant_name, quantity, price)
             VALUES (5002, 77, 'Fries', 1, 5.5);",
    )
    .execute(&db.pool)
    .await
    .unwrap();

    let mut config = Config::with_overrides("/tmp/print-relay-test", 0, 0);
    config.print_retry_delay_ms = 0;
    ServerState::with_db(config, db)
}

pub fn token(state: &ServerState, role: &str, permissions: &[&str]) -> String {
    let permissions: Vec<String> = permissions.iter().map(|p| p.to_string()).collect();
    state
        .jwt_service()
        .generate_token("12", "tester", role, &permissions)
        .unwrap()
}
