//! Product collaborator: stock reads and the atomic ledger adjustment.
//!
//! Products are owned by the catalog side of the platform. The order core
//! only reads them and applies signed stock/sold deltas.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub store_id: Uuid,
    pub title: String,
    pub price_cents: i64,
    pub stock: i32,
    pub sold: i32,
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT id, store_id, title, price_cents, stock, sold FROM products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(db)
    .await
}

pub async fn find_many(db: &PgPool, ids: &[Uuid]) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        "SELECT id, store_id, title, price_cents, stock, sold FROM products WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(db)
    .await
}

/// Single-statement read-modify-write, so concurrent ship/cancel events on
/// different orders referencing the same product compose without lost
/// updates.
pub async fn adjust_stock(
    conn: &mut PgConnection,
    id: Uuid,
    stock_delta: i32,
    sold_delta: i32,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET stock = stock + $2, sold = sold + $3 WHERE id = $1")
        .bind(id)
        .bind(stock_delta)
        .bind(sold_delta)
        .execute(conn)
        .await?;
    Ok(())
}
