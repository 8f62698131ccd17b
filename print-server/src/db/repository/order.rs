//! Order Repository
//!
//! 打印只读取订单快照，不修改订单。

use std::collections::HashMap;

use shared::models::{ComboItem, ItemOption, OrderItemSnapshot, OrderSnapshot};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::RepoResult;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<OrderSnapshot>> {
    let row = sqlx::query_as::<_, OrderSnapshot>(
        "SELECT id, order_number, status, table_name, subtotal, discount, tax, total, created_at FROM orders WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// 按 id 批量加载菜品 (含选项和套餐子项)
///
/// 只返回存在的行，按 id 升序；重复 id 只出现一次。
pub async fn find_items_by_ids(
    pool: &SqlitePool,
    item_ids: &[i64],
) -> RepoResult<Vec<OrderItemSnapshot>> {
    if item_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, order_id, product_variant_name, quantity, price, note FROM order_item WHERE id IN (",
    );
    push_id_list(&mut qb, item_ids);
    qb.push(" ORDER BY id");
    let mut items = qb
        .build_query_as::<OrderItemSnapshot>()
        .fetch_all(pool)
        .await?;

    if items.is_empty() {
        return Ok(items);
    }

    let found: Vec<i64> = items.iter().map(|i| i.id).collect();
    let mut options = load_options(pool, &found).await?;
    let mut combos = load_combo_items(pool, &found).await?;

    for item in &mut items {
        item.options = options.remove(&item.id).unwrap_or_default();
        item.combo_items = combos.remove(&item.id).unwrap_or_default();
    }

    Ok(items)
}

async fn load_options(
    pool: &SqlitePool,
    item_ids: &[i64],
) -> RepoResult<HashMap<i64, Vec<ItemOption>>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT order_item_id, name, price FROM order_item_option WHERE order_item_id IN (",
    );
    push_id_list(&mut qb, item_ids);
    qb.push(" ORDER BY id");
    let rows = qb.build_query_as::<ItemOption>().fetch_all(pool).await?;

    let mut grouped: HashMap<i64, Vec<ItemOption>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_item_id).or_default().push(row);
    }
    Ok(grouped)
}

async fn load_combo_items(
    pool: &SqlitePool,
    item_ids: &[i64],
) -> RepoResult<HashMap<i64, Vec<ComboItem>>> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT order_item_id, name, quantity FROM order_item_combo WHERE order_item_id IN (",
    );
    push_id_list(&mut qb, item_ids);
    qb.push(" ORDER BY id");
    let rows = qb.build_query_as::<ComboItem>().fetch_all(pool).await?;

    let mut grouped: HashMap<i64, Vec<ComboItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_item_id).or_default().push(row);
    }
    Ok(grouped)
}

/// Appends `?, ?, ...)` bound to `ids`
fn push_id_list(qb: &mut QueryBuilder<'_, Sqlite>, ids: &[i64]) {
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");
}
