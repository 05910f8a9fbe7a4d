//! Address book handlers.

use axum::extract::{Path, State};
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use sylera_core::AddressId;

use crate::db::addresses::{self, Address, NewAddress};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireUser;
use crate::state::AppState;

/// Build the addresses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", delete(remove))
        .route("/{id}/default", patch(set_default))
}

/// List the user's addresses, default first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Address>>> {
    let addresses = addresses::list_for_user(state.pool(), user.id).await?;
    Ok(Json(addresses))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub is_default: bool,
}

impl CreateAddressRequest {
    /// The first required field that is empty, if any.
    fn missing_field(&self) -> Option<&'static str> {
        let required = [
            ("fullName", &self.full_name),
            ("phone", &self.phone),
            ("line1", &self.line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postalCode", &self.postal_code),
            ("country", &self.country),
        ];
        required
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
    }
}

/// Create an address. Requesting it as default clears the user's other
/// defaults in the same transaction.
///
/// # Errors
///
/// Returns a validation error when a required field is empty.
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(body): Json<CreateAddressRequest>,
) -> Result<Json<Address>> {
    if let Some(field) = body.missing_field() {
        return Err(AppError::Validation(format!(
            "Missing required field: {field}"
        )));
    }

    let new = NewAddress {
        full_name: body.full_name,
        phone: body.phone,
        line1: body.line1,
        line2: body.line2,
        city: body.city,
        state: body.state,
        postal_code: body.postal_code,
        country: body.country,
        is_default: body.is_default,
    };

    let address = addresses::insert(state.pool(), user.id, &new).await?;
    Ok(Json(address))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Delete an address owned by the user; absence is a no-op.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn remove(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(address_id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    addresses::delete(state.pool(), user.id, address_id).await?;

    Ok(Json(MessageResponse {
        message: "Address deleted",
    }))
}

/// Make an address the default, atomically clearing the previous one.
///
/// # Errors
///
/// Returns `NotFound` if the address does not belong to the user.
pub async fn set_default(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(address_id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    addresses::set_default(state.pool(), user.id, address_id).await?;

    Ok(Json(MessageResponse {
        message: "Default address updated",
    }))
}
