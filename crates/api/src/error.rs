//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers return
//! `Result<T, AppError>`. Responses are JSON `{"message": …}` with a short
//! human-readable message; internals never leak on 5xx.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::db::cart::CartError;
use crate::db::orders::OrderError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("{0}")]
    Unauthorized(String),

    /// Caller is authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// State conflict (duplicate insert, disallowed transition).
    #[error("{0}")]
    Conflict(String),

    /// Checkout with no cart lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// Requested quantity exceeds on-hand stock.
    #[error("Not enough stock for {0}")]
    OutOfStock(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Database(e) => Self::Database(RepositoryError::Database(e)),
            CartError::ProductNotFound => Self::NotFound("Product not found".into()),
            CartError::OutOfStock { name } => Self::OutOfStock(name),
            CartError::CartNotFound => Self::NotFound("Cart not found".into()),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Database(e) => Self::Database(RepositoryError::Database(e)),
            OrderError::EmptyCart => Self::EmptyCart,
            OrderError::OutOfStock { name } => Self::OutOfStock(name),
            OrderError::NotFound => Self::NotFound("Order not found".into()),
            OrderError::InvalidTransition { from, to } => {
                Self::Conflict(format!("Order cannot move from {from} to {to}"))
            }
            OrderError::Corrupt(e) => {
                Self::Database(RepositoryError::DataCorruption(e))
            }
            OrderError::TotalOverflow => Self::Internal("order total overflow".into()),
        }
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound(_) => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Validation(_) | Self::EmptyCart | Self::OutOfStock(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            match &self {
                Self::Database(err) => err.to_string(),
                other => other.to_string(),
            }
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use sylera_core::OrderStatus;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_client_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(get_status(AppError::EmptyCart), StatusCode::BAD_REQUEST);
        assert_eq!(
            get_status(AppError::OutOfStock("ring".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("gone".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("no token".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("admin only".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::Conflict("duplicate".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_server_error_status_codes() {
        assert_eq!(
            get_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::DataCorruption(
                "bad row".into()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_keep_their_status() {
        assert_eq!(
            get_status(AppError::Database(RepositoryError::NotFound("x".into()))),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Database(RepositoryError::Conflict("x".into()))),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_order_error_conversions() {
        assert!(matches!(
            AppError::from(OrderError::EmptyCart),
            AppError::EmptyCart
        ));
        assert!(matches!(
            AppError::from(OrderError::OutOfStock {
                name: "ring".into()
            }),
            AppError::OutOfStock(_)
        ));

        let conflict = AppError::from(OrderError::InvalidTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        });
        assert_eq!(get_status(conflict), StatusCode::CONFLICT);
    }

    #[test]
    fn test_messages_for_business_rejections() {
        assert_eq!(AppError::EmptyCart.to_string(), "Cart is empty");
        assert_eq!(
            AppError::OutOfStock("Classic Gold Ring".into()).to_string(),
            "Not enough stock for Classic Gold Ring"
        );
    }
}
