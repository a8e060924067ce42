//! Cart endpoints (buyer only).
//!
//! Handlers load the buyer's active cart, run the mutation on the aggregate
//! and persist the result; the aggregate recomputes the total before every
//! save.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, Role};
use crate::db::{carts, products, profiles};
use crate::domain::cart::Cart;
use crate::error::AppError;
use crate::http::ApiResponse;
use crate::state::AppState;

async fn active_buyer(state: &AppState, user: &AuthUser) -> Result<profiles::Buyer, AppError> {
    user.require(&[Role::Buyer])?;
    profiles::buyer_by_user(&state.db, user.user_id)
        .await?
        .ok_or(AppError::NotFound("Buyer profile"))
}

pub async fn get_cart(State(state): State<AppState>, user: AuthUser) -> Result<Response, AppError> {
    let buyer = active_buyer(&state, &user).await?;
    match carts::active_for_buyer(&state.db, buyer.id).await? {
        Some(cart) if !cart.is_empty() => {
            Ok(ApiResponse::new("Cart fetched successfully", cart).into_response())
        }
        _ => Ok(ApiResponse::new(
            "Cart is empty",
            serde_json::json!({ "items": [], "total_cents": 0 }),
        )
        .into_response()),
    }
}

#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AddToCartRequest>,
) -> Result<Response, AppError> {
    let buyer = active_buyer(&state, &user).await?;
    let product = products::find(&state.db, req.product_id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    // Created lazily on the first add.
    let mut cart = carts::active_for_buyer(&state.db, buyer.id)
        .await?
        .unwrap_or_else(|| Cart::new(buyer.id));
    cart.add_item(product.id, req.quantity, product.price_cents, product.stock)?;
    carts::save(&state.db, &cart).await?;

    Ok(ApiResponse::new("Item successfully added to cart", cart).into_response())
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i32,
}

pub async fn update_item_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Response, AppError> {
    let buyer = active_buyer(&state, &user).await?;
    let mut cart = carts::active_for_buyer(&state.db, buyer.id)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;
    let product = products::find(&state.db, product_id)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    cart.update_quantity(product_id, req.quantity, product.stock)?;
    carts::save(&state.db, &cart).await?;

    Ok(ApiResponse::new("Cart updated successfully", cart).into_response())
}

pub async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let buyer = active_buyer(&state, &user).await?;
    let mut cart = carts::active_for_buyer(&state.db, buyer.id)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;

    cart.remove_item(product_id)?;
    carts::save(&state.db, &cart).await?;

    Ok(ApiResponse::new("Cart updated successfully", cart).into_response())
}

pub async fn clear_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Response, AppError> {
    let buyer = active_buyer(&state, &user).await?;
    let mut cart = carts::active_for_buyer(&state.db, buyer.id)
        .await?
        .ok_or(AppError::NotFound("Cart"))?;

    cart.clear();
    carts::save(&state.db, &cart).await?;

    Ok(ApiResponse::new("Cart cleared successfully", cart).into_response())
}
