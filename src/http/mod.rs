//! HTTP surface: routing and the `{message, data?}` response envelope.

use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod cart;
pub mod order;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(|| async { Json(serde_json::json!({"status": "healthy", "service": "bazari"})) }),
        )
        .route("/cart", get(cart::get_cart))
        .route("/cart/add", post(cart::add_to_cart))
        .route("/cart/update/:product_id", put(cart::update_item_quantity))
        .route("/cart/remove/:product_id", delete(cart::remove_item))
        .route("/cart/clear", delete(cart::clear_cart))
        .route("/order/create", post(order::create_order))
        .route("/order/getOrders", get(order::get_user_orders))
        .route("/order/store/all", get(order::get_store_orders))
        .route("/order/:id", get(order::get_order_by_id))
        .route("/order/cancel/:id", put(order::cancel_order))
        .route("/order/update/:id", put(order::update_order_status))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
