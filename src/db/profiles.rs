//! Buyer and seller identity lookup by authenticated user id.

use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Buyer {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Seller {
    pub id: Uuid,
    pub user_id: Uuid,
    pub store_id: Option<Uuid>,
}

pub async fn buyer_by_user(db: &PgPool, user_id: Uuid) -> Result<Option<Buyer>, sqlx::Error> {
    sqlx::query_as::<_, Buyer>("SELECT id, user_id, name FROM buyers WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
}

pub async fn seller_by_user(db: &PgPool, user_id: Uuid) -> Result<Option<Seller>, sqlx::Error> {
    sqlx::query_as::<_, Seller>("SELECT id, user_id, store_id FROM sellers WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await
}
