//! Wishlist handlers.
//!
//! Adding is idempotent: a duplicate add reports success and leaves a
//! single entry behind.

use axum::extract::{Path, State};
use axum::routing::{delete, get};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sylera_core::{Money, ProductId};

use crate::db::wishlist;
use crate::error::Result;
use crate::middleware::auth::RequireUser;
use crate::state::AppState;

/// Build the wishlist router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(add))
        .route("/{product_id}", delete(remove))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntryResponse {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub image: Option<String>,
    pub added_at: DateTime<Utc>,
}

/// The user's wishlist, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<WishlistEntryResponse>>> {
    let entries = wishlist::list(state.pool(), user.id).await?;

    Ok(Json(
        entries
            .into_iter()
            .map(|entry| WishlistEntryResponse {
                product_id: entry.product_id,
                name: entry.name,
                price: entry.price,
                image: entry.image_url,
                added_at: entry.added_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWishlistRequest {
    pub product_id: ProductId,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Add a product to the wishlist; duplicates are a success.
///
/// # Errors
///
/// Returns `NotFound` for an unknown product.
pub async fn add(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<AddWishlistRequest>,
) -> Result<Json<MessageResponse>> {
    wishlist::add(state.pool(), user.id, body.product_id).await?;

    Ok(Json(MessageResponse {
        message: "Added to wishlist",
    }))
}

/// Remove a product from the wishlist; absence is not an error.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn remove(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    wishlist::remove(state.pool(), user.id, product_id).await?;

    Ok(Json(MessageResponse {
        message: "Removed from wishlist",
    }))
}
