//! Order handlers: checkout for users, status management for admins.
//!
//! Notifications are spawned only after the order transaction has
//! committed, so a slow or failing mail relay can never hold a database
//! transaction open or roll an order back.

use axum::extract::{Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use sylera_core::{OrderId, OrderStatus, PaymentMethod, UserId};

use crate::db::orders::{self, AdminOrder, Order, OrderDetails, ShippingAddress};
use crate::db::users;
use crate::error::{AppError, Result};
use crate::middleware::auth::{RequireAdmin, RequireUser};
use crate::state::AppState;

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(place_cod).get(list_all))
        .route("/manual-upi", post(place_manual_upi))
        .route("/my", get(my_orders))
        .route("/{id}", patch(update_status).delete(remove))
}

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub address: ShippingAddress,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderResponse {
    pub order_id: OrderId,
}

/// Place a cash-on-delivery order.
///
/// # Errors
///
/// Returns a validation error for an incomplete address, `EmptyCart` for a
/// cart with no lines, and a stock rejection when quantities can no longer
/// be filled.
pub async fn place_cod(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>> {
    place(user.id, state, body, PaymentMethod::Cod).await
}

/// Place an order the customer claims to have paid via UPI. Staff verify
/// the payment manually before confirming.
///
/// # Errors
///
/// Same failure modes as [`place_cod`].
pub async fn place_manual_upi(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>> {
    place(user.id, state, body, PaymentMethod::ManualUpi).await
}

async fn place(
    user_id: UserId,
    state: AppState,
    body: PlaceOrderRequest,
    method: PaymentMethod,
) -> Result<Json<PlaceOrderResponse>> {
    if let Some(field) = body.address.missing_field() {
        return Err(AppError::Validation(format!(
            "Missing required address field: {field}"
        )));
    }

    let placed = orders::place_order(state.pool(), user_id, &body.address, method).await?;

    // Best-effort notifications, strictly after commit.
    match users::get(state.pool(), user_id).await {
        Ok(Some(user)) => {
            let notifier = state.notifier().clone();
            tokio::spawn(async move {
                notifier.order_placed(&user.email, placed.id, placed.total).await;
                notifier
                    .new_order_ops(placed.id, &user.email, placed.total)
                    .await;
            });
        }
        Ok(None) => {
            tracing::warn!(%user_id, "order placed but user row is gone, skipping notification");
        }
        Err(e) => {
            tracing::warn!(%user_id, error = %e, "could not load user for order notification");
        }
    }

    Ok(Json(PlaceOrderResponse { order_id: placed.id }))
}

/// The user's own orders, newest first, with items and address snapshots.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn my_orders(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderDetails>>> {
    let orders = orders::list_for_user(state.pool(), user.id).await?;
    Ok(Json(orders))
}

/// All orders with customer details (admin).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_all(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminOrder>>> {
    let orders = orders::list_all(state.pool()).await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// Move an order to a new status (admin).
///
/// Transitions into `CONFIRMED` and `DELIVERED` notify the customer;
/// nothing else does.
///
/// # Errors
///
/// Returns `NotFound` for a missing order and a conflict for a move the
/// transition table rejects.
pub async fn update_status(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Order>> {
    let order = orders::set_status(state.pool(), order_id, body.status).await?;

    if matches!(order.status, OrderStatus::Confirmed | OrderStatus::Delivered) {
        notify_status_change(&state, &order).await;
    }

    Ok(Json(order))
}

async fn notify_status_change(state: &AppState, order: &Order) {
    match users::get(state.pool(), order.user_id).await {
        Ok(Some(user)) => {
            let notifier = state.notifier().clone();
            let status = order.status;
            let order_id = order.id;
            tokio::spawn(async move {
                match status {
                    OrderStatus::Confirmed => notifier.order_confirmed(&user.email, order_id).await,
                    OrderStatus::Delivered => notifier.order_delivered(&user.email, order_id).await,
                    _ => {}
                }
            });
        }
        Ok(None) => {
            tracing::warn!(order_id = %order.id, "order user is gone, skipping status notification");
        }
        Err(e) => {
            tracing::warn!(order_id = %order.id, error = %e, "could not load user for status notification");
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Hard-delete an order (admin).
///
/// # Errors
///
/// Returns `NotFound` if the order does not exist.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<MessageResponse>> {
    orders::delete(state.pool(), order_id).await?;

    Ok(Json(MessageResponse {
        message: "Order removed",
    }))
}
