//! Database operations for the Sylera `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users`, `otp_verifications` - OTP login identities
//! - `products`, `product_images`, `tags`, `product_tags` - catalog
//! - `carts`, `cart_items` - one cart per user
//! - `addresses` - shipping address book
//! - `orders`, `order_addresses`, `order_items` - order history with frozen
//!   prices and an address snapshot
//! - `wishlist_items` - (user, product) pairs
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p sylera-cli -- migrate
//! ```
//! They are never run on server startup.

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod addresses;
pub mod cart;
pub mod orders;
pub mod otp;
pub mod products;
pub mod users;
pub mod wishlist;

/// Error type shared by the repository modules.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The referenced row does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness or state conflict.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A stored value failed to parse into its domain type.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Whether a sqlx error is a Postgres unique constraint violation (23505).
#[must_use]
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
