//! Catalog handlers: public listing and detail, admin management.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sylera_core::{Money, ProductId};

use crate::db::products::{
    self, NewProduct, Product, ProductFilters, ProductPatch, ProductSort,
};
use crate::error::{AppError, Result};
use crate::middleware::auth::RequireAdmin;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: i64 = 12;
const MAX_PAGE_SIZE: i64 = 100;

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(show).patch(update).delete(remove))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    pub category: Option<String>,
    pub base_color: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub is_premium: bool,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
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
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductResponse {
    fn from_product(product: Product, image: Option<String>) -> Self {
        Self {
            id: product.id,
            name: product.name,
            description: product.description,
            price: product.price,
            discounted_price: product.discounted_price,
            category: product.category,
            base_color: product.base_color,
            material: product.material,
            weight_grams: product.weight_grams,
            quantity: product.quantity,
            is_premium: product.is_premium,
            image,
            created_at: product.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub data: Vec<ProductResponse>,
    pub pagination: Pagination,
}

/// Filtered, sorted, paginated product listing.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<ProductListResponse>> {
    let sort = match query.sort.as_deref() {
        Some("price_asc") => ProductSort::PriceAsc,
        Some("price_desc") => ProductSort::PriceDesc,
        _ => ProductSort::Newest,
    };

    let filters = ProductFilters {
        min_price: query.min_price.map(Money::from_minor),
        max_price: query.max_price.map(Money::from_minor),
        category: query.category,
        base_color: query.base_color,
        in_stock_only: query.in_stock,
        premium_only: query.is_premium,
        sort,
    };

    let page = query.page.unwrap_or(1).max(1);
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (products, total) = products::list(state.pool(), &filters, page, limit).await?;

    let ids: Vec<ProductId> = products.iter().map(|p| p.id).collect();
    let mut images = products::first_images(state.pool(), &ids).await?;

    let data = products
        .into_iter()
        .map(|product| {
            let image = images.remove(&product.id);
            ProductResponse::from_product(product, image)
        })
        .collect();

    Ok(Json(ProductListResponse {
        data,
        pagination: Pagination {
            total,
            page,
            pages: (total as u64).div_ceil(limit as u64) as i64,
        },
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailResponse {
    #[serde(flatten)]
    pub product: ProductResponse,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

/// A single product with images and tags.
///
/// # Errors
///
/// Returns `NotFound` for an unknown product.
pub async fn show(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ProductDetailResponse>> {
    let details = products::get_details(state.pool(), product_id).await?;
    let first = details.images.first().cloned();

    Ok(Json(ProductDetailResponse {
        product: ProductResponse::from_product(details.product, first),
        images: details.images,
        tags: details.tags,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: i64,
    pub discounted_price: Option<i64>,
    pub category: String,
    pub base_color: String,
    pub material: Option<String>,
    pub weight_grams: Option<f32>,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Create a product (admin).
///
/// # Errors
///
/// Returns a validation error for empty required fields or a discount
/// above the list price.
pub async fn create(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<Json<ProductDetailResponse>> {
    if body.name.trim().is_empty()
        || body.category.trim().is_empty()
        || body.base_color.trim().is_empty()
    {
        return Err(AppError::Validation(
            "name, category, and baseColor are required".into(),
        ));
    }
    if body.price < 0 || body.quantity < 0 {
        return Err(AppError::Validation(
            "price and quantity must not be negative".into(),
        ));
    }
    if body.discounted_price.is_some_and(|d| d < 0 || d > body.price) {
        return Err(AppError::Validation(
            "discountedPrice must be between 0 and price".into(),
        ));
    }

    let new = NewProduct {
        name: body.name,
        description: body.description,
        price: Money::from_minor(body.price),
        discounted_price: body.discounted_price.map(Money::from_minor),
        category: body.category,
        base_color: body.base_color,
        material: body.material,
        weight_grams: body.weight_grams,
        quantity: body.quantity,
        is_premium: body.is_premium,
        images: body.images,
        tags: body.tags,
    };

    let product_id = products::create(state.pool(), &new).await?;
    show(State(state), Path(product_id)).await
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub discounted_price: Option<i64>,
    /// Remove the discount entirely.
    #[serde(default)]
    pub clear_discount: bool,
    pub category: Option<String>,
    pub base_color: Option<String>,
    pub quantity: Option<i32>,
    pub is_premium: Option<bool>,
}

/// Partially update a product (admin).
///
/// # Errors
///
/// Returns `NotFound` for an unknown product.
pub async fn update(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ProductDetailResponse>> {
    let discounted_price = if body.clear_discount {
        Some(None)
    } else {
        body.discounted_price.map(|d| Some(Money::from_minor(d)))
    };

    let patch = ProductPatch {
        name: body.name,
        description: body.description,
        price: body.price.map(Money::from_minor),
        discounted_price,
        category: body.category,
        base_color: body.base_color,
        quantity: body.quantity,
        is_premium: body.is_premium,
    };

    products::update(state.pool(), product_id, &patch).await?;
    show(State(state), Path(product_id)).await
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Delete a product and its owned children (admin).
///
/// # Errors
///
/// Returns `NotFound` for an unknown product and a conflict if order
/// history references it.
pub async fn remove(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    products::delete(state.pool(), product_id).await?;

    Ok(Json(MessageResponse {
        message: "Product deleted",
    }))
}
