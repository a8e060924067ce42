//! Cart persistence.
//!
//! A cart is saved document-style: the row is upserted and its lines are
//! rewritten, mirroring how the aggregate mutates in memory.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::cart::{Cart, CartItem, CartStatus};

#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: Uuid,
    buyer_id: Uuid,
    status: String,
    total_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    product_id: Uuid,
    quantity: i32,
    unit_price_cents: i64,
}

/// The buyer's single active cart, if one exists.
pub async fn active_for_buyer(db: &PgPool, buyer_id: Uuid) -> Result<Option<Cart>, sqlx::Error> {
    let row = sqlx::query_as::<_, CartRow>(
        "SELECT id, buyer_id, status, total_cents FROM carts \
         WHERE buyer_id = $1 AND status = 'active'",
    )
    .bind(buyer_id)
    .fetch_optional(db)
    .await?;
    let Some(row) = row else { return Ok(None) };

    let items = sqlx::query_as::<_, CartItemRow>(
        "SELECT product_id, quantity, unit_price_cents FROM cart_items WHERE cart_id = $1",
    )
    .bind(row.id)
    .fetch_all(db)
    .await?;

    let status: CartStatus = row
        .status
        .parse()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Some(Cart {
        id: row.id,
        buyer_id: row.buyer_id,
        status,
        total_cents: row.total_cents,
        items: items
            .into_iter()
            .map(|i| CartItem {
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price_cents: i.unit_price_cents,
            })
            .collect(),
    }))
}

/// Upserts the cart row and rewrites its lines on the given connection, so
/// callers can fold the save into a wider transaction.
pub async fn save_with(conn: &mut PgConnection, cart: &Cart) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO carts (id, buyer_id, status, total_cents) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (id) DO UPDATE \
         SET status = EXCLUDED.status, total_cents = EXCLUDED.total_cents, updated_at = NOW()",
    )
    .bind(cart.id)
    .bind(cart.buyer_id)
    .bind(cart.status.as_str())
    .bind(cart.total_cents)
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *conn)
        .await?;

    for item in &cart.items {
        sqlx::query(
            "INSERT INTO cart_items (cart_id, product_id, quantity, unit_price_cents) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(cart.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn save(db: &PgPool, cart: &Cart) -> Result<(), sqlx::Error> {
    let mut tx = db.begin().await?;
    save_with(&mut *tx, cart).await?;
    tx.commit().await
}
