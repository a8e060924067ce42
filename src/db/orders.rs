//! Order persistence.
//!
//! Orders are written once at checkout and only their status/payment columns
//! change afterwards; the line items never do.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus, PaymentStatus};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub order_number: String,
    pub buyer_id: Uuid,
    pub total_cents: i64,
    pub shipping_name: String,
    pub shipping_phone: String,
    pub shipping_street: String,
    pub shipping_city: String,
    pub shipping_country: String,
    pub shipping_postal_code: String,
    pub payment_method: String,
    pub payment_status: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItemRow {
    #[serde(skip_serializing)]
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub store_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

/// An order row together with its immutable lines, as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRecord {
    #[serde(flatten)]
    pub order: OrderRow,
    pub items: Vec<OrderItemRow>,
}

const SELECT_ORDER: &str = "SELECT id, order_number, buyer_id, total_cents, \
    shipping_name, shipping_phone, shipping_street, shipping_city, shipping_country, \
    shipping_postal_code, payment_method, payment_status, status, created_at, updated_at \
    FROM orders";

const SELECT_ITEMS: &str =
    "SELECT order_id, product_id, store_id, quantity, unit_price_cents FROM order_items";

/// Inserts the order snapshot and its lines on the given connection; the
/// caller owns the surrounding transaction.
pub async fn create(conn: &mut PgConnection, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, buyer_id, total_cents, \
         shipping_name, shipping_phone, shipping_street, shipping_city, shipping_country, \
         shipping_postal_code, payment_method, payment_status, status) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.buyer_id)
    .bind(order.total_cents)
    .bind(&order.shipping_address.name)
    .bind(&order.shipping_address.phone)
    .bind(&order.shipping_address.street)
    .bind(&order.shipping_address.city)
    .bind(&order.shipping_address.country)
    .bind(&order.shipping_address.postal_code)
    .bind(order.payment_method.as_str())
    .bind(order.payment_status.as_str())
    .bind(order.status.as_str())
    .execute(&mut *conn)
    .await?;

    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, store_id, quantity, unit_price_cents) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.store_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<OrderRecord>, sqlx::Error> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    let Some(row) = row else { return Ok(None) };
    let items = sqlx::query_as::<_, OrderItemRow>(&format!("{SELECT_ITEMS} WHERE order_id = $1"))
        .bind(id)
        .fetch_all(db)
        .await?;
    Ok(Some(OrderRecord { order: row, items }))
}

pub async fn find_for_buyer(
    db: &PgPool,
    id: Uuid,
    buyer_id: Uuid,
) -> Result<Option<OrderRecord>, sqlx::Error> {
    match find(db, id).await? {
        Some(record) if record.order.buyer_id == buyer_id => Ok(Some(record)),
        _ => Ok(None),
    }
}

pub async fn list_for_buyer(db: &PgPool, buyer_id: Uuid) -> Result<Vec<OrderRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{SELECT_ORDER} WHERE buyer_id = $1 ORDER BY created_at DESC"
    ))
    .bind(buyer_id)
    .fetch_all(db)
    .await?;
    attach_items(db, rows).await
}

/// Every order touching the store, i.e. with at least one line sold by it.
pub async fn list_for_store(db: &PgPool, store_id: Uuid) -> Result<Vec<OrderRecord>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{SELECT_ORDER} WHERE id IN (SELECT order_id FROM order_items WHERE store_id = $1) \
         ORDER BY created_at DESC"
    ))
    .bind(store_id)
    .fetch_all(db)
    .await?;
    attach_items(db, rows).await
}

async fn attach_items(db: &PgPool, rows: Vec<OrderRow>) -> Result<Vec<OrderRecord>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let items = sqlx::query_as::<_, OrderItemRow>(&format!("{SELECT_ITEMS} WHERE order_id = ANY($1)"))
        .bind(&ids)
        .fetch_all(db)
        .await?;

    let mut by_order: HashMap<Uuid, Vec<OrderItemRow>> = HashMap::new();
    for item in items {
        by_order.entry(item.order_id).or_default().push(item);
    }
    Ok(rows
        .into_iter()
        .map(|order| {
            let items = by_order.remove(&order.id).unwrap_or_default();
            OrderRecord { order, items }
        })
        .collect())
}

pub async fn set_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: OrderStatus,
    payment_status: Option<PaymentStatus>,
) -> Result<(), sqlx::Error> {
    match payment_status {
        Some(payment) => {
            sqlx::query(
                "UPDATE orders SET status = $2, payment_status = $3, updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(id)
            .bind(status.as_str())
            .bind(payment.as_str())
            .execute(conn)
            .await?;
        }
        None => {
            sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(conn)
                .await?;
        }
    }
    Ok(())
}
