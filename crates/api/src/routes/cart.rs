//! Cart handlers, keyed by the authenticated user.

use axum::extract::{Path, State};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use sylera_core::{Money, ProductId};

use crate::db::cart;
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireUser;
use crate::state::AppState;

/// Build the cart router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(show))
        .route("/add", post(add))
        .route("/update", patch(update))
        .route("/remove/{product_id}", delete(remove))
}

#[derive(Debug, Serialize)]
pub struct CartItemResponse {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
}

/// The user's cart with resolved display prices. A user without a cart
/// gets an empty list.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>> {
    let lines = cart::lines(state.pool(), user.id).await?;

    Ok(Json(CartResponse {
        items: lines
            .into_iter()
            .map(|line| CartItemResponse {
                id: line.product_id,
                name: line.name,
                price: line.unit_price,
                image: line.image_url,
                quantity: line.quantity,
            })
            .collect(),
    }))
}

const fn default_quantity() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Add a product to the cart, creating the cart on first use.
///
/// # Errors
///
/// Returns `NotFound` for an unknown product and a stock rejection when the
/// cumulative quantity exceeds what is on hand.
pub async fn add(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<AddToCartRequest>,
) -> Result<Json<MessageResponse>> {
    if body.quantity < 1 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }

    cart::add_item(state.pool(), user.id, body.product_id, body.quantity).await?;

    Ok(Json(MessageResponse {
        message: "Added to cart",
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: ProductId,
    pub quantity: i32,
}

/// Set a cart line's quantity; zero deletes the line.
///
/// # Errors
///
/// Returns a validation error for negative quantities and `NotFound` when
/// the user has no cart.
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<UpdateQuantityRequest>,
) -> Result<Json<MessageResponse>> {
    if body.quantity < 0 {
        return Err(AppError::Validation("Invalid quantity".into()));
    }

    cart::set_quantity(state.pool(), user.id, body.product_id, body.quantity).await?;

    Ok(Json(MessageResponse {
        message: "Cart updated",
    }))
}

/// Remove a product from the cart. Removing an absent line succeeds.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn remove(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    cart::remove_item(state.pool(), user.id, product_id).await?;

    Ok(Json(MessageResponse {
        message: "Removed from cart",
    }))
}
