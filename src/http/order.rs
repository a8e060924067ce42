//! Order endpoints: checkout, buyer queries and cancel, and the seller
//! status workflow.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AuthUser, Role};
use crate::db::{carts, orders, products, profiles};
use crate::domain::order::{
    Order, OrderError, OrderStatus, PaymentMethod, PaymentStatus, ProductSnapshot,
    ShippingAddress, Transition,
};
use crate::error::AppError;
use crate::events;
use crate::http::ApiResponse;
use crate::state::AppState;

async fn buyer_profile(state: &AppState, user: &AuthUser) -> Result<profiles::Buyer, AppError> {
    profiles::buyer_by_user(&state.db, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Buyer profile"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShippingAddressPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "phone is required"))]
    pub phone: String,
    #[validate(length(min = 1, message = "street is required"))]
    pub street: String,
    #[validate(length(min = 1, message = "city is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "postal code is required"))]
    pub postal_code: String,
}

impl From<ShippingAddressPayload> for ShippingAddress {
    fn from(p: ShippingAddressPayload) -> Self {
        Self {
            name: p.name,
            phone: p.phone,
            street: p.street,
            city: p.city,
            country: p.country,
            postal_code: p.postal_code,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address: ShippingAddressPayload,
}

/// The cart-to-order transition. Order insert and cart clear/`ordered` flip
/// commit together in one transaction; a failed checkout leaves the cart
/// untouched.
pub async fn create_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Response, AppError> {
    user.require(&[Role::Buyer])?;
    req.shipping_address.validate()?;
    let buyer = buyer_profile(&state, &user).await?;

    let mut cart = carts::active_for_buyer(&state.db, buyer.id)
        .await?
        .ok_or(AppError::Order(OrderError::EmptyCart))?;

    let ids: Vec<Uuid> = cart.items.iter().map(|i| i.product_id).collect();
    let snapshots: Vec<ProductSnapshot> = products::find_many(&state.db, &ids)
        .await?
        .into_iter()
        .map(|p| ProductSnapshot {
            id: p.id,
            store_id: p.store_id,
            title: p.title,
            stock: p.stock,
        })
        .collect();

    let order = Order::checkout(buyer.id, &cart, &snapshots, req.shipping_address.into())?;

    let mut tx = state.db.begin().await?;
    orders::create(&mut tx, &order).await?;
    cart.mark_ordered();
    carts::save_with(&mut tx, &cart).await?;
    tx.commit().await?;

    tracing::info!(order_id = %order.id, buyer_id = %buyer.id, total_cents = order.total_cents, "order placed");
    events::publish(
        &state.nats,
        events::ORDER_CREATED,
        json!({ "order_id": order.id, "buyer_id": buyer.id, "total_cents": order.total_cents }),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        ApiResponse::new("Order placed successfully", order),
    )
        .into_response())
}

pub async fn get_user_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(&[Role::Buyer, Role::Admin])?;
    let buyer = buyer_profile(&state, &user).await?;
    let orders = orders::list_for_buyer(&state.db, buyer.id).await?;
    let message = if orders.is_empty() {
        "You have no orders currently"
    } else {
        "Orders fetched successfully"
    };
    Ok(ApiResponse::new(message, orders).into_response())
}

pub async fn get_order_by_id(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    user.require(&[Role::Buyer])?;
    let buyer = buyer_profile(&state, &user).await?;
    let record = orders::find_for_buyer(&state.db, id, buyer.id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;
    Ok(ApiResponse::new("Order fetched successfully", record).into_response())
}

/// Buyer self-cancel, allowed only before shipment. Stock is untouched:
/// nothing was committed for an unshipped order.
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    user.require(&[Role::Buyer])?;
    let buyer = buyer_profile(&state, &user).await?;
    let mut record = orders::find_for_buyer(&state.db, id, buyer.id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let current: OrderStatus = record.order.status.parse()?;
    let next = current.buyer_cancel()?;

    let mut conn = state.db.acquire().await?;
    orders::set_status(&mut conn, id, next, None).await?;
    record.order.status = next.as_str().to_string();

    events::publish(
        &state.nats,
        events::ORDER_STATUS,
        json!({ "order_id": id, "from": current, "to": next }),
    )
    .await;

    Ok(ApiResponse::new("Order cancelled successfully", record).into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Seller-driven status workflow. Stock/sold movements are edge-triggered
/// (into `shipped`, and `shipped` into `cancelled`) and run in the same
/// transaction as the status write, so an order observed as `shipped` has
/// had its deltas applied exactly once.
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Response, AppError> {
    user.require(&[Role::Seller])?;
    let mut record = orders::find(&state.db, id)
        .await?
        .ok_or(AppError::NotFound("Order"))?;

    let current: OrderStatus = record.order.status.parse()?;
    let target: OrderStatus = req.status.parse()?;
    let method: PaymentMethod = record.order.payment_method.parse()?;
    let plan = Transition::plan(current, target, method)?;

    let mut tx = state.db.begin().await?;
    for item in &record.items {
        if let Some((stock_delta, sold_delta)) = plan.stock.deltas(item.quantity) {
            products::adjust_stock(&mut tx, item.product_id, stock_delta, sold_delta).await?;
            tracing::debug!(
                product_id = %item.product_id,
                stock_delta,
                sold_delta,
                "stock adjusted"
            );
        }
    }
    let payment = plan.settle_cod.then_some(PaymentStatus::Paid);
    orders::set_status(&mut tx, id, plan.status, payment).await?;
    tx.commit().await?;

    record.order.status = plan.status.as_str().to_string();
    if let Some(paid) = payment {
        record.order.payment_status = paid.as_str().to_string();
    }

    tracing::info!(order_id = %id, from = %current, to = %plan.status, "order status updated");
    events::publish(
        &state.nats,
        events::ORDER_STATUS,
        json!({ "order_id": id, "from": current, "to": plan.status }),
    )
    .await;

    Ok(ApiResponse::new("Order status updated successfully", record).into_response())
}

/// Orders touching the seller's store: any order with at least one line sold
/// by it.
pub async fn get_store_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    user.require(&[Role::Seller])?;
    let seller = profiles::seller_by_user(&state.db, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Seller profile"))?;
    let store_id = seller.store_id.ok_or(AppError::NotFound("Store"))?;

    let orders = orders::list_for_store(&state.db, store_id).await?;
    let message = if orders.is_empty() {
        "Your store has no orders yet"
    } else {
        "Store orders fetched successfully"
    };
    Ok(ApiResponse::new(message, orders).into_response())
}
