//! Printer Repository

use shared::models::{Printer, Store};
use sqlx::SqlitePool;

use super::RepoResult;

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Printer>> {
    let row = sqlx::query_as::<_, Printer>("SELECT id, name, store_id FROM printer WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_store(pool: &SqlitePool, store_id: i64) -> RepoResult<Option<Store>> {
    let row = sqlx::query_as::<_, Store>("SELECT id, uuid, name FROM store WHERE id = ?")
        .bind(store_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
