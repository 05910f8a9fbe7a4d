//! Seed the catalog with sample jewellery products.
//!
//! Clears the existing catalog (products, images, tag links, and dependent
//! cart/wishlist rows go with them via cascade) and inserts a small set of
//! products for local development.

use sqlx::{PgPool, Postgres, Transaction};
use tracing::info;

use sylera_core::Money;

use super::CommandError;

struct SeedProduct {
    name: &'static str,
    price: Money,
    discounted_price: Option<Money>,
    is_premium: bool,
    category: &'static str,
    base_color: &'static str,
    description: &'static str,
    material: &'static str,
    weight_grams: f32,
    quantity: i32,
    images: &'static [&'static str],
    tags: &'static [&'static str],
}

const CATALOG: &[SeedProduct] = &[
    SeedProduct {
        name: "Classic Gold Ring",
        price: Money::from_rupees(29_999),
        discounted_price: Some(Money::from_rupees(24_999)),
        is_premium: true,
        category: "ring",
        base_color: "gold",
        description: "Elegant 18K gold ring perfect for weddings.",
        material: "18K Gold",
        weight_grams: 4.5,
        quantity: 5,
        images: &[
            "https://cdn.sylera.in/products/gold-ring-1.jpg",
            "https://cdn.sylera.in/products/gold-ring-2.jpg",
        ],
        tags: &["wedding", "festive"],
    },
    SeedProduct {
        name: "Silver Pearl Necklace",
        price: Money::from_rupees(15_999),
        discounted_price: Some(Money::from_rupees(10_000)),
        is_premium: false,
        category: "necklace",
        base_color: "silver",
        description: "Minimal silver necklace with pearls.",
        material: "Sterling Silver",
        weight_grams: 6.2,
        quantity: 3,
        images: &["https://cdn.sylera.in/products/pearl-necklace-1.jpg"],
        tags: &["daily-wear"],
    },
    SeedProduct {
        name: "Rose Gold Earrings",
        price: Money::from_rupees(8_999),
        discounted_price: Some(Money::from_rupees(6_000)),
        is_premium: false,
        category: "earring",
        base_color: "rose-gold",
        description: "Stylish rose gold earrings for everyday elegance.",
        material: "Rose Gold",
        weight_grams: 3.1,
        quantity: 10,
        images: &["https://cdn.sylera.in/products/rose-gold-earrings-1.jpg"],
        tags: &["daily-wear", "festive"],
    },
];

/// Reset the catalog and insert the sample products.
///
/// # Errors
///
/// Returns an error if any database operation fails.
pub async fn run() -> Result<(), CommandError> {
    let pool = super::connect().await?;

    let mut tx = pool.begin().await?;

    // Cascades clear images, tag links, cart lines, and wishlist entries.
    sqlx::query("DELETE FROM products").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM tags").execute(&mut *tx).await?;

    for product in CATALOG {
        insert_product(&mut tx, product).await?;
    }

    tx.commit().await?;

    info!(products = CATALOG.len(), "catalog seeded");
    verify(&pool).await?;

    Ok(())
}

async fn insert_product(
    tx: &mut Transaction<'_, Postgres>,
    product: &SeedProduct,
) -> Result<(), CommandError> {
    let (product_id,): (i64,) = sqlx::query_as(
        r"
        INSERT INTO products
            (name, description, price, discounted_price, category, base_color,
             material, weight_grams, quantity, is_premium)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id
        ",
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.discounted_price)
    .bind(product.category)
    .bind(product.base_color)
    .bind(product.material)
    .bind(product.weight_grams)
    .bind(product.quantity)
    .bind(product.is_premium)
    .fetch_one(&mut **tx)
    .await?;

    for (position, url) in product.images.iter().enumerate() {
        sqlx::query(
            "INSERT INTO product_images (product_id, image_url, position) VALUES ($1, $2, $3)",
        )
        .bind(product_id)
        .bind(url)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut **tx)
        .await?;
    }

    for tag in product.tags {
        let (tag_id,): (i64,) = sqlx::query_as(
            r"
            INSERT INTO tags (name) VALUES ($1)
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id
            ",
        )
        .bind(tag)
        .fetch_one(&mut **tx)
        .await?;

        sqlx::query("INSERT INTO product_tags (product_id, tag_id) VALUES ($1, $2)")
            .bind(product_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }

    Ok(())
}

async fn verify(pool: &PgPool) -> Result<(), CommandError> {
    let (products,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;
    let (tags,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tags")
        .fetch_one(pool)
        .await?;

    info!(products, tags, "seed verified");
    Ok(())
}
