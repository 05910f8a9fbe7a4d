//! Shipping address book.
//!
//! At most one address per user carries `is_default`. Every path that sets
//! a default clears the user's other defaults first, inside the same
//! transaction, so no interleaving can observe two defaults. A partial
//! unique index backs this up at the schema level.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use sylera_core::{AddressId, UserId};

use super::RepositoryError;

/// A stored shipping address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for creating an address.
#[derive(Debug, Clone)]
pub struct NewAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

const ADDRESS_COLUMNS: &str = "id, user_id, full_name, phone, line1, line2, city, state, \
     postal_code, country, is_default, created_at";

/// List the user's addresses, default first, then newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<Address>, RepositoryError> {
    let addresses = sqlx::query_as::<_, Address>(&format!(
        r"
        SELECT {ADDRESS_COLUMNS} FROM addresses
        WHERE user_id = $1
        ORDER BY is_default DESC, created_at DESC
        ",
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(addresses)
}

/// Insert a new address; when it is flagged default, other defaults are
/// cleared in the same transaction.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn insert(
    pool: &PgPool,
    user_id: UserId,
    new: &NewAddress,
) -> Result<Address, RepositoryError> {
    let mut tx = pool.begin().await?;

    if new.is_default {
        sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
    }

    let address = sqlx::query_as::<_, Address>(&format!(
        r"
        INSERT INTO addresses
            (user_id, full_name, phone, line1, line2, city, state, postal_code,
             country, is_default)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {ADDRESS_COLUMNS}
        ",
    ))
    .bind(user_id)
    .bind(&new.full_name)
    .bind(&new.phone)
    .bind(&new.line1)
    .bind(&new.line2)
    .bind(&new.city)
    .bind(&new.state)
    .bind(&new.postal_code)
    .bind(&new.country)
    .bind(new.is_default)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(address)
}

/// Delete an address, scoped to the owning user. Deleting someone else's
/// address (or one that no longer exists) is a no-op.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn delete(
    pool: &PgPool,
    user_id: UserId,
    address_id: AddressId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
        .bind(address_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Make an address the user's default: clear-all-then-set-one in a single
/// transaction.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the address does not belong to
/// the user.
pub async fn set_default(
    pool: &PgPool,
    user_id: UserId,
    address_id: AddressId,
) -> Result<(), RepositoryError> {
    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE addresses SET is_default = FALSE WHERE user_id = $1 AND is_default")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let updated = sqlx::query("UPDATE addresses SET is_default = TRUE WHERE id = $1 AND user_id = $2")
        .bind(address_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if updated.rows_affected() == 0 {
        return Err(RepositoryError::NotFound("address not found".into()));
    }

    tx.commit().await?;

    Ok(())
}
