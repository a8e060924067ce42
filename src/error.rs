//! Application error taxonomy and its HTTP mapping.
//!
//! Every handler returns `Result<_, AppError>`; the `IntoResponse` impl is
//! the single place domain errors become status codes and the
//! `{message, error?}` envelope.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::domain::cart::CartError;
use crate::domain::order::OrderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Cart(#[from] CartError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error("No identity, authorization denied")]
    Unauthorized,
    #[error("Access denied, only [{0}] allowed")]
    Forbidden(String),
    #[error(transparent)]
    Validation(#[from] validator::ValidationErrors),
    #[error("Internal Server Error")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_)
            | Self::Cart(CartError::ItemNotFound)
            | Self::Order(OrderError::ProductNotFound) => StatusCode::NOT_FOUND,
            Self::Cart(_) | Self::Order(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Database(err) => {
                tracing::error!(error = %err, "request failed");
                json!({ "message": "Internal Server Error", "error": err.to_string() })
            }
            other => json!({ "message": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        assert_eq!(AppError::NotFound("Product").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Cart(CartError::InsufficientStock).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Cart(CartError::ItemNotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Order(OrderError::InvalidStatus).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Forbidden("buyer".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }
}
