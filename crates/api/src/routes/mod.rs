//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness check
//! GET  /health/ready                - Readiness check (database ping)
//!
//! # Auth
//! POST /api/auth/send-otp           - Issue an OTP for a phone number
//! POST /api/auth/verify-otp         - Verify an OTP, get a token
//! POST /api/auth/complete-profile   - Finish registration (profile token)
//! GET  /api/auth/me                 - Current user
//!
//! # Products
//! GET    /api/products              - Filtered/paginated listing
//! GET    /api/products/{id}         - Product with images and tags
//! POST   /api/products              - Create product (admin)
//! PATCH  /api/products/{id}         - Update product (admin)
//! DELETE /api/products/{id}         - Delete product (admin)
//!
//! # Cart
//! GET    /api/cart                  - Cart lines with resolved prices
//! POST   /api/cart/add              - Add a product
//! PATCH  /api/cart/update           - Set a line quantity (0 deletes)
//! DELETE /api/cart/remove/{id}      - Remove a product
//!
//! # Addresses
//! GET    /api/addresses             - List (default first)
//! POST   /api/addresses             - Create
//! DELETE /api/addresses/{id}        - Delete
//! PATCH  /api/addresses/{id}/default - Make default
//!
//! # Orders
//! POST   /api/orders                - Place a COD order
//! POST   /api/orders/manual-upi     - Place a manual-UPI order
//! GET    /api/orders/my             - Own orders, newest first
//! GET    /api/orders                - All orders (admin)
//! PATCH  /api/orders/{id}           - Update status (admin)
//! DELETE /api/orders/{id}           - Hard delete (admin)
//!
//! # Wishlist
//! GET    /api/wishlist              - List entries
//! POST   /api/wishlist              - Add (idempotent)
//! DELETE /api/wishlist/{id}         - Remove
//! ```

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod wishlist;

use axum::Router;

use crate::state::AppState;

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::router())
        .nest("/api/products", products::router())
        .nest("/api/cart", cart::router())
        .nest("/api/addresses", addresses::router())
        .nest("/api/orders", orders::router())
        .nest("/api/wishlist", wishlist::router())
}
