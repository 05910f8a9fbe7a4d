//! Cart storage: one cart per user, one line per (cart, product).
//!
//! The cart is created lazily on first add. The stock check here is
//! advisory (it keeps obviously-unfillable carts out); the order
//! transaction in [`super::orders`] is the authoritative gate.

use sqlx::PgPool;
use thiserror::Error;

use sylera_core::{CartId, Money, ProductId, UserId};

use super::products::resolve_price;

/// Cart operation errors.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("product not found")]
    ProductNotFound,

    #[error("not enough stock for {name}")]
    OutOfStock { name: String },

    #[error("cart not found")]
    CartNotFound,
}

/// A cart line with its resolved display price.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i32,
    pub image_url: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    name: String,
    price: Money,
    discounted_price: Option<Money>,
    quantity: i32,
    image_url: Option<String>,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> Self {
        Self {
            product_id: row.product_id,
            name: row.name,
            unit_price: resolve_price(row.price, row.discounted_price),
            quantity: row.quantity,
            image_url: row.image_url,
        }
    }
}

/// Find the user's cart ID, if they have one.
async fn find_cart(pool: &PgPool, user_id: UserId) -> Result<Option<CartId>, sqlx::Error> {
    let row: Option<(CartId,)> = sqlx::query_as("SELECT id FROM carts WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|(id,)| id))
}

/// Get the user's cart, creating it on first use.
async fn get_or_create_cart(pool: &PgPool, user_id: UserId) -> Result<CartId, sqlx::Error> {
    let (id,): (CartId,) = sqlx::query_as(
        r"
        INSERT INTO carts (user_id) VALUES ($1)
        ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
        RETURNING id
        ",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// Add `quantity` of a product to the user's cart, creating the line or
/// incrementing an existing one.
///
/// # Errors
///
/// Returns `ProductNotFound` for an unknown product and `OutOfStock` when
/// the cumulative cart quantity would exceed the on-hand quantity.
pub async fn add_item(
    pool: &PgPool,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), CartError> {
    let product: Option<(String, i32)> =
        sqlx::query_as("SELECT name, quantity FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;

    let (name, on_hand) = product.ok_or(CartError::ProductNotFound)?;

    let cart_id = get_or_create_cart(pool, user_id).await?;

    let existing: Option<(i32,)> = sqlx::query_as(
        "SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;

    let cumulative = existing.map_or(0, |(q,)| q).saturating_add(quantity);
    if cumulative > on_hand {
        return Err(CartError::OutOfStock { name });
    }

    sqlx::query(
        r"
        INSERT INTO cart_items (cart_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(())
}

/// Set the quantity of a cart line; zero or below deletes the line.
///
/// # Errors
///
/// Returns `CartNotFound` if the user has never had a cart.
pub async fn set_quantity(
    pool: &PgPool,
    user_id: UserId,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), CartError> {
    let cart_id = find_cart(pool, user_id)
        .await?
        .ok_or(CartError::CartNotFound)?;

    if quantity <= 0 {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .execute(pool)
            .await?;
        return Ok(());
    }

    sqlx::query(
        r"
        INSERT INTO cart_items (cart_id, product_id, quantity)
        VALUES ($1, $2, $3)
        ON CONFLICT (cart_id, product_id)
        DO UPDATE SET quantity = EXCLUDED.quantity
        ",
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a product from the user's cart. Absence of the cart or the line
/// is not an error.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn remove_item(
    pool: &PgPool,
    user_id: UserId,
    product_id: ProductId,
) -> Result<(), CartError> {
    let Some(cart_id) = find_cart(pool, user_id).await? else {
        return Ok(());
    };

    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND product_id = $2")
        .bind(cart_id)
        .bind(product_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Read the user's cart lines with resolved display prices.
///
/// A user without a cart gets an empty list, never an error.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn lines(pool: &PgPool, user_id: UserId) -> Result<Vec<CartLine>, CartError> {
    let rows = sqlx::query_as::<_, CartLineRow>(
        r"
        SELECT ci.product_id, p.name, p.price, p.discounted_price, ci.quantity,
               (SELECT pi.image_url FROM product_images pi
                WHERE pi.product_id = p.id
                ORDER BY pi.position, pi.id LIMIT 1) AS image_url
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        JOIN products p ON p.id = ci.product_id
        WHERE c.user_id = $1
        ORDER BY ci.id
        ",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(CartLine::from).collect())
}
