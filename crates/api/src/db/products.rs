//! Catalog queries: products, images, and tags.
//!
//! Shoppers only read the catalog; create/update/delete are admin
//! operations. Deleting a product cascades to its images, tag links, cart
//! lines, and wishlist entries; products referenced by order history cannot
//! be deleted.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sylera_core::{Money, ProductId};

use super::RepositoryError;

/// A catalog product row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub discounted_price: Option<Money>,
    pub category: String,
    pub base_color: String,
    pub material: Option<String>,
    pub weight_grams: Option<f32>,
    pub quantity: i32,
    pub is_premium: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The display price: the discounted price when present and lower than the
/// list price, otherwise the list price.
#[must_use]
pub fn resolve_price(price: Money, discounted_price: Option<Money>) -> Money {
    match discounted_price {
        Some(d) if d < price => d,
        _ => price,
    }
}

/// A product with its image URLs (in display order) and tag names.
#[derive(Debug, Clone)]
pub struct ProductDetails {
    pub product: Product,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

/// How to sort a product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilters {
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub category: Option<String>,
    pub base_color: Option<String>,
    pub in_stock_only: bool,
    pub premium_only: bool,
    pub sort: ProductSort,
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub discounted_price: Option<Money>,
    pub category: String,
    pub base_color: String,
    pub material: Option<String>,
    pub weight_grams: Option<f32>,
    pub quantity: i32,
    pub is_premium: bool,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

/// Partial update for a product; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub discounted_price: Option<Option<Money>>,
    pub category: Option<String>,
    pub base_color: Option<String>,
    pub quantity: Option<i32>,
    pub is_premium: Option<bool>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price, discounted_price, category, \
     base_color, material, weight_grams, quantity, is_premium, created_at, updated_at";

/// List products matching the filters, with the total match count for
/// pagination.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(
    pool: &PgPool,
    filters: &ProductFilters,
    page: i64,
    limit: i64,
) -> Result<(Vec<Product>, i64), RepositoryError> {
    let sort_key = match filters.sort {
        ProductSort::Newest => "newest",
        ProductSort::PriceAsc => "price_asc",
        ProductSort::PriceDesc => "price_desc",
    };
    let offset = (page.max(1) - 1) * limit;

    let products = sqlx::query_as::<_, Product>(&format!(
        r"
        SELECT {PRODUCT_COLUMNS} FROM products
        WHERE ($1::BIGINT IS NULL OR price >= $1)
          AND ($2::BIGINT IS NULL OR price <= $2)
          AND ($3::TEXT IS NULL OR category = $3)
          AND ($4::TEXT IS NULL OR base_color = $4)
          AND (NOT $5 OR quantity > 0)
          AND (NOT $6 OR is_premium)
        ORDER BY
            CASE WHEN $7 = 'price_asc' THEN price END ASC,
            CASE WHEN $7 = 'price_desc' THEN price END DESC,
            created_at DESC
        LIMIT $8 OFFSET $9
        ",
    ))
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(&filters.category)
    .bind(&filters.base_color)
    .bind(filters.in_stock_only)
    .bind(filters.premium_only)
    .bind(sort_key)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as(
        r"
        SELECT COUNT(*) FROM products
        WHERE ($1::BIGINT IS NULL OR price >= $1)
          AND ($2::BIGINT IS NULL OR price <= $2)
          AND ($3::TEXT IS NULL OR category = $3)
          AND ($4::TEXT IS NULL OR base_color = $4)
          AND (NOT $5 OR quantity > 0)
          AND (NOT $6 OR is_premium)
        ",
    )
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(&filters.category)
    .bind(&filters.base_color)
    .bind(filters.in_stock_only)
    .bind(filters.premium_only)
    .fetch_one(pool)
    .await?;

    Ok((products, total))
}

/// Get a product by ID.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn get(pool: &PgPool, id: ProductId) -> Result<Option<Product>, RepositoryError> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(product)
}

/// Get a product with its images and tags.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product does not exist.
pub async fn get_details(pool: &PgPool, id: ProductId) -> Result<ProductDetails, RepositoryError> {
    let product = get(pool, id)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("product not found".into()))?;

    let images: Vec<(String,)> = sqlx::query_as(
        r"
        SELECT image_url FROM product_images
        WHERE product_id = $1
        ORDER BY position, id
        ",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    let tags: Vec<(String,)> = sqlx::query_as(
        r"
        SELECT t.name FROM tags t
        JOIN product_tags pt ON pt.tag_id = t.id
        WHERE pt.product_id = $1
        ORDER BY t.name
        ",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(ProductDetails {
        product,
        images: images.into_iter().map(|(url,)| url).collect(),
        tags: tags.into_iter().map(|(name,)| name).collect(),
    })
}

/// Create a product with its images and tags in one transaction.
///
/// Tag names are upserted into the shared tag table.
///
/// # Errors
///
/// Returns an error if any insert fails.
pub async fn create(pool: &PgPool, new: &NewProduct) -> Result<ProductId, RepositoryError> {
    let mut tx = pool.begin().await?;

    let (product_id,): (i64,) = sqlx::query_as(
        r"
        INSERT INTO products
            (name, description, price, discounted_price, category, base_color,
             material, weight_grams, quantity, is_premium)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        ",
    )
    .bind(&new.name)
    .bind(&new.description)
    .bind(new.price)
    .bind(new.discounted_price)
    .bind(&new.category)
    .bind(&new.base_color)
    .bind(&new.material)
    .bind(new.weight_grams)
    .bind(new.quantity)
    .bind(new.is_premium)
    .fetch_one(&mut *tx)
    .await?;

    for (position, url) in new.images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_images (product_id, image_url, position) VALUES ($1, $2, $3)",
        )
        .bind(product_id)
        .bind(url)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await?;
    }

    for tag in &new.tags {
        let (tag_id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO tags (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(tag)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            INSERT INTO product_tags (product_id, tag_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(product_id)
        .bind(tag_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(ProductId::new(product_id))
}

/// Apply a partial update to a product.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product does not exist.
pub async fn update(
    pool: &PgPool,
    id: ProductId,
    patch: &ProductPatch,
) -> Result<Product, RepositoryError> {
    // discounted_price distinguishes "leave unchanged" (outer None) from
    // "clear the discount" (Some(None))
    let clear_discount = matches!(patch.discounted_price, Some(None));
    let new_discount = patch.discounted_price.flatten();

    let product = sqlx::query_as::<_, Product>(&format!(
        r"
        UPDATE products SET
            name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            discounted_price = CASE WHEN $5 THEN NULL
                                    ELSE COALESCE($6, discounted_price) END,
            category = COALESCE($7, category),
            base_color = COALESCE($8, base_color),
            quantity = COALESCE($9, quantity),
            is_premium = COALESCE($10, is_premium),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {PRODUCT_COLUMNS}
        ",
    ))
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.description)
    .bind(patch.price)
    .bind(clear_discount)
    .bind(new_discount)
    .bind(&patch.category)
    .bind(&patch.base_color)
    .bind(patch.quantity)
    .bind(patch.is_premium)
    .fetch_optional(pool)
    .await?;

    product.ok_or_else(|| RepositoryError::NotFound("product not found".into()))
}

/// First image URL for each of the given products.
///
/// Products without images are simply absent from the map.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn first_images(
    pool: &PgPool,
    ids: &[ProductId],
) -> Result<std::collections::HashMap<ProductId, String>, RepositoryError> {
    let raw_ids: Vec<i64> = ids.iter().map(|id| id.as_i64()).collect();

    let rows: Vec<(ProductId, String)> = sqlx::query_as(
        r"
        SELECT DISTINCT ON (product_id) product_id, image_url
        FROM product_images
        WHERE product_id = ANY($1)
        ORDER BY product_id, position, id
        ",
    )
    .bind(&raw_ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

/// Delete a product; owned children go with it via cascade.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the product does not exist and
/// `RepositoryError::Conflict` if order history references it.
pub async fn delete(pool: &PgPool, id: ProductId) -> Result<(), RepositoryError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await;

    match result {
        Ok(done) if done.rows_affected() == 0 => {
            Err(RepositoryError::NotFound("product not found".into()))
        }
        Ok(_) => Ok(()),
        Err(e) if is_foreign_key_violation(&e) => Err(RepositoryError::Conflict(
            "product has order history and cannot be deleted".into(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Whether a sqlx error is a Postgres foreign key violation (23503).
fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23503"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_price_prefers_lower_discount() {
        let price = Money::from_minor(29_999);
        assert_eq!(
            resolve_price(price, Some(Money::from_minor(24_999))),
            Money::from_minor(24_999)
        );
    }

    #[test]
    fn test_resolve_price_ignores_missing_discount() {
        let price = Money::from_minor(15_999);
        assert_eq!(resolve_price(price, None), price);
    }

    #[test]
    fn test_resolve_price_ignores_higher_discount() {
        // A "discount" above list price is never shown to the shopper.
        let price = Money::from_minor(10_000);
        assert_eq!(resolve_price(price, Some(Money::from_minor(12_000))), price);
    }

    #[test]
    fn test_resolve_price_equal_discount_uses_list() {
        let price = Money::from_minor(10_000);
        assert_eq!(resolve_price(price, Some(price)), price);
    }
}
