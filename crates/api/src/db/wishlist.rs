//! Wishlist storage: unique (user, product) pairs.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sylera_core::{Money, ProductId, UserId};

use super::RepositoryError;
use super::products::resolve_price;

/// A wishlist entry joined with its product.
#[derive(Debug, Clone)]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct WishlistRow {
    product_id: ProductId,
    name: String,
    price: Money,
    discounted_price: Option<Money>,
    image_url: Option<String>,
    added_at: DateTime<Utc>,
}

/// Add a product to the user's wishlist.
///
/// Adding a product that is already wishlisted is a success, not an error;
/// the unique constraint absorbs the duplicate.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` for an unknown product.
pub async fn add(
    pool: &PgPool,
    user_id: UserId,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        return Err(RepositoryError::NotFound("product not found".into()));
    }

    sqlx::query(
        r"
        INSERT INTO wishlist_items (user_id, product_id)
        VALUES ($1, $2)
        ON CONFLICT (user_id, product_id) DO NOTHING
        ",
    )
    .bind(user_id)
    .bind(product_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a product from the user's wishlist; absence is not an error.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn remove(
    pool: &PgPool,
    user_id: UserId,
    product_id: ProductId,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// List the user's wishlist with resolved prices and first images, newest
/// first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(pool: &PgPool, user_id: UserId) -> Result<Vec<WishlistEntry>, RepositoryError> {
    let rows = sqlx::query_as::<_, WishlistRow>(
        r"
        SELECT w.product_id, p.name, p.price, p.discounted_price,
               (SELECT pi.image_url FROM product_images pi
                WHERE pi.product_id = p.id
                ORDER BY pi.position, pi.id LIMIT 1) AS image_url,
               w.created_at AS added_at
        FROM wishlist_items w
        JOIN products p ON p.id = w.product_id
        WHERE w.user_id = $1
        ORDER BY w.created_at DESC, w.id DESC
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| WishlistEntry {
            product_id: row.product_id,
            name: row.name,
            price: resolve_price(row.price, row.discounted_price),
            image_url: row.image_url,
            added_at: row.added_at,
        })
        .collect())
}
