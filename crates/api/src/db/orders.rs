//! Order workflow and history.
//!
//! [`place_order`] is the one multi-entity transaction in the system: it
//! turns the cart snapshot into a durable order (frozen item prices, copied
//! address), decrements stock, and clears the cart, all-or-nothing. The
//! cart lines are read `FOR UPDATE`, which serializes two concurrent
//! checkouts for the same user: the loser re-reads after the winner's
//! commit, finds the cart empty, and fails with `EmptyCart` instead of
//! producing a second order.
//!
//! Notifications are the caller's job and must only be fired after the
//! transaction commits.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use sylera_core::{Money, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

use super::products::resolve_price;

/// Flat shipping surcharge added to every order. Zero for now; kept as a
/// named constant so free shipping is a policy, not an accident.
const SHIPPING_FEE: Money = Money::ZERO;

/// Order workflow errors.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("cart is empty")]
    EmptyCart,

    #[error("not enough stock for {name}")]
    OutOfStock { name: String },

    #[error("order not found")]
    NotFound,

    #[error("cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("data corruption: {0}")]
    Corrupt(String),

    #[error("order total overflows")]
    TotalOverflow,
}

/// A shipping address, either incoming from a checkout request or read
/// back from an order's snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

impl ShippingAddress {
    /// The first required field that is empty, if any. `line2` is optional.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
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

/// An order row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub total: Money,
    pub created_at: DateTime<Utc>,
}

/// An order line with the price frozen at order-creation time.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(skip)]
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i32,
}

/// An order with its items and address snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub address: Option<ShippingAddress>,
}

/// Customer summary attached to admin order listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCustomer {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// An order with customer details, for the admin listing.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrder {
    #[serde(flatten)]
    pub details: OrderDetails,
    pub user: OrderCustomer,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Copy)]
pub struct PlacedOrder {
    pub id: OrderId,
    pub total: Money,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: String,
    payment_method: String,
    total: Money,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, OrderError> {
        let status = self
            .status
            .parse()
            .map_err(|e: String| OrderError::Corrupt(e))?;
        let payment_method = self
            .payment_method
            .parse()
            .map_err(|e: String| OrderError::Corrupt(e))?;

        Ok(Order {
            id: self.id,
            user_id: self.user_id,
            status,
            payment_method,
            total: self.total,
            created_at: self.created_at,
        })
    }
}

/// A cart line as seen by checkout, with current product state.
#[derive(Debug, sqlx::FromRow)]
struct CheckoutLine {
    product_id: ProductId,
    name: String,
    price: Money,
    discounted_price: Option<Money>,
    quantity: i32,
}

/// Sum of resolved unit price times quantity over the cart snapshot, in
/// minor units. `None` on overflow.
fn snapshot_subtotal(lines: &[CheckoutLine]) -> Option<Money> {
    lines.iter().try_fold(Money::ZERO, |acc, line| {
        let unit = resolve_price(line.price, line.discounted_price);
        let line_total = unit.checked_mul(i64::from(line.quantity))?;
        acc.checked_add(line_total)
    })
}

#[derive(Debug, sqlx::FromRow)]
struct OrderAddressRow {
    order_id: OrderId,
    full_name: String,
    phone: String,
    line1: String,
    line2: Option<String>,
    city: String,
    state: String,
    postal_code: String,
    country: String,
}

impl From<OrderAddressRow> for ShippingAddress {
    fn from(row: OrderAddressRow) -> Self {
        Self {
            full_name: row.full_name,
            phone: row.phone,
            line1: row.line1,
            line2: row.line2,
            city: row.city,
            state: row.state,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, status, payment_method, total, created_at";

/// Place an order from the user's cart as a single atomic unit.
///
/// Steps, all inside one transaction: lock and load the cart snapshot,
/// compute the integer subtotal from resolved prices, decrement stock,
/// insert the order with frozen item prices and a copied address, clear
/// the cart. A failure at any step persists nothing.
///
/// # Errors
///
/// Returns `EmptyCart` when the user has no cart lines, `OutOfStock` when
/// any line exceeds the remaining on-hand quantity, and `Database` for
/// store failures.
pub async fn place_order(
    pool: &PgPool,
    user_id: UserId,
    address: &ShippingAddress,
    payment_method: PaymentMethod,
) -> Result<PlacedOrder, OrderError> {
    let mut tx = pool.begin().await?;

    // Lock the cart lines and the products they reference. Concurrent
    // checkouts for the same user (or the same stock) queue up here.
    let lines: Vec<CheckoutLine> = sqlx::query_as(
        r"
        SELECT ci.product_id, p.name, p.price, p.discounted_price, ci.quantity
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        JOIN products p ON p.id = ci.product_id
        WHERE c.user_id = $1
        ORDER BY ci.id
        FOR UPDATE OF ci, p
        ",
    )
    .bind(user_id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let subtotal = snapshot_subtotal(&lines).ok_or(OrderError::TotalOverflow)?;
    let total = subtotal
        .checked_add(SHIPPING_FEE)
        .ok_or(OrderError::TotalOverflow)?;

    // Reserve stock; a miss means another order got there first.
    for line in &lines {
        let updated = sqlx::query(
            "UPDATE products SET quantity = quantity - $2 WHERE id = $1 AND quantity >= $2",
        )
        .bind(line.product_id)
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(OrderError::OutOfStock {
                name: line.name.clone(),
            });
        }
    }

    let (order_id,): (OrderId,) = sqlx::query_as(
        r"
        INSERT INTO orders (user_id, status, payment_method, total)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        ",
    )
    .bind(user_id)
    .bind(payment_method.initial_status().to_string())
    .bind(payment_method.to_string())
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    // Address snapshot: a copy owned by the order, never a live reference.
    sqlx::query(
        r"
        INSERT INTO order_addresses
            (order_id, full_name, phone, line1, line2, city, state, postal_code, country)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ",
    )
    .bind(order_id)
    .bind(&address.full_name)
    .bind(&address.phone)
    .bind(&address.line1)
    .bind(&address.line2)
    .bind(&address.city)
    .bind(&address.state)
    .bind(&address.postal_code)
    .bind(&address.country)
    .execute(&mut *tx)
    .await?;

    // Items with the unit price frozen at this instant.
    for line in &lines {
        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, name, unit_price, quantity)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(order_id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(resolve_price(line.price, line.discounted_price))
        .bind(line.quantity)
        .execute(&mut *tx)
        .await?;
    }

    // Clearing the cart commits or rolls back together with the order.
    sqlx::query(
        r"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.cart_id = c.id AND c.user_id = $1
        ",
    )
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%order_id, %user_id, total = %total, method = %payment_method, "order placed");

    Ok(PlacedOrder {
        id: order_id,
        total,
    })
}

/// List the user's orders, newest first, with items and address snapshots.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_for_user(
    pool: &PgPool,
    user_id: UserId,
) -> Result<Vec<OrderDetails>, OrderError> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        r"
        SELECT {ORDER_COLUMNS} FROM orders
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        ",
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let orders = rows
        .into_iter()
        .map(OrderRow::into_order)
        .collect::<Result<Vec<_>, _>>()?;

    attach_details(pool, orders).await
}

/// List all orders with customer details, newest first (admin).
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list_all(pool: &PgPool) -> Result<Vec<AdminOrder>, OrderError> {
    #[derive(sqlx::FromRow)]
    struct AdminOrderRow {
        id: OrderId,
        user_id: UserId,
        status: String,
        payment_method: String,
        total: Money,
        created_at: DateTime<Utc>,
        user_name: String,
        user_email: String,
        user_phone: String,
    }

    let rows: Vec<AdminOrderRow> = sqlx::query_as(
        r"
        SELECT o.id, o.user_id, o.status, o.payment_method, o.total, o.created_at,
               u.name AS user_name, u.email AS user_email, u.phone AS user_phone
        FROM orders o
        JOIN users u ON u.id = o.user_id
        ORDER BY o.created_at DESC, o.id DESC
        ",
    )
    .fetch_all(pool)
    .await?;

    let mut orders = Vec::with_capacity(rows.len());
    let mut customers = Vec::with_capacity(rows.len());
    for row in rows {
        customers.push(OrderCustomer {
            id: row.user_id,
            name: row.user_name.clone(),
            email: row.user_email.clone(),
            phone: row.user_phone.clone(),
        });
        orders.push(
            OrderRow {
                id: row.id,
                user_id: row.user_id,
                status: row.status,
                payment_method: row.payment_method,
                total: row.total,
                created_at: row.created_at,
            }
            .into_order()?,
        );
    }

    let details = attach_details(pool, orders).await?;

    Ok(details
        .into_iter()
        .zip(customers)
        .map(|(details, user)| AdminOrder { details, user })
        .collect())
}

/// Batch-load items and address snapshots for a page of orders.
async fn attach_details(
    pool: &PgPool,
    orders: Vec<Order>,
) -> Result<Vec<OrderDetails>, OrderError> {
    let ids: Vec<i64> = orders.iter().map(|o| o.id.as_i64()).collect();

    let item_rows: Vec<OrderItem> = sqlx::query_as(
        r"
        SELECT order_id, product_id, name, unit_price, quantity
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY id
        ",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let address_rows: Vec<OrderAddressRow> = sqlx::query_as(
        r"
        SELECT order_id, full_name, phone, line1, line2, city, state, postal_code, country
        FROM order_addresses
        WHERE order_id = ANY($1)
        ",
    )
    .bind(&ids)
    .fetch_all(pool)
    .await?;

    let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for item in item_rows {
        items_by_order.entry(item.order_id).or_default().push(item);
    }

    let mut address_by_order: HashMap<OrderId, ShippingAddress> = address_rows
        .into_iter()
        .map(|row| (row.order_id, ShippingAddress::from(row)))
        .collect();

    Ok(orders
        .into_iter()
        .map(|order| {
            let items = items_by_order.remove(&order.id).unwrap_or_default();
            let address = address_by_order.remove(&order.id);
            OrderDetails {
                order,
                items,
                address,
            }
        })
        .collect())
}

/// Move an order to a new status, enforcing the transition table.
///
/// Returns the updated order; the caller decides which transitions notify
/// the customer.
///
/// # Errors
///
/// Returns `NotFound` for a missing order and `InvalidTransition` for a
/// disallowed move.
pub async fn set_status(
    pool: &PgPool,
    order_id: OrderId,
    new_status: OrderStatus,
) -> Result<Order, OrderError> {
    let mut tx = pool.begin().await?;

    let current: Option<(String,)> =
        sqlx::query_as("SELECT status FROM orders WHERE id = $1 FOR UPDATE")
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?;

    let (current,) = current.ok_or(OrderError::NotFound)?;
    let current: OrderStatus = current.parse().map_err(|e: String| OrderError::Corrupt(e))?;

    if !current.can_transition_to(new_status) {
        return Err(OrderError::InvalidTransition {
            from: current,
            to: new_status,
        });
    }

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "UPDATE orders SET status = $2 WHERE id = $1 RETURNING {ORDER_COLUMNS}"
    ))
    .bind(order_id)
    .bind(new_status.to_string())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(%order_id, from = %current, to = %new_status, "order status updated");

    row.into_order()
}

/// Hard-delete an order; items and the address snapshot cascade.
///
/// # Errors
///
/// Returns `NotFound` if the order does not exist.
pub async fn delete(pool: &PgPool, order_id: OrderId) -> Result<(), OrderError> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(order_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(OrderError::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price: i64, discounted: Option<i64>, quantity: i32) -> CheckoutLine {
        CheckoutLine {
            product_id: ProductId::new(1),
            name: "test".into(),
            price: Money::from_minor(price),
            discounted_price: discounted.map(Money::from_minor),
            quantity,
        }
    }

    #[test]
    fn test_subtotal_mixed_cart() {
        // {productA: qty 2 @ 100, productB: qty 1 @ 250} totals 450
        let lines = vec![line(100, None, 2), line(250, None, 1)];
        assert_eq!(snapshot_subtotal(&lines), Some(Money::from_minor(450)));
    }

    #[test]
    fn test_subtotal_uses_resolved_prices() {
        // Discounted price wins when lower, is ignored when higher.
        let lines = vec![line(29_999, Some(24_999), 1), line(100, Some(150), 2)];
        assert_eq!(snapshot_subtotal(&lines), Some(Money::from_minor(25_199)));
    }

    #[test]
    fn test_subtotal_empty_snapshot_is_zero() {
        assert_eq!(snapshot_subtotal(&[]), Some(Money::ZERO));
    }

    #[test]
    fn test_subtotal_overflow_is_none() {
        let lines = vec![line(i64::MAX, None, 2)];
        assert_eq!(snapshot_subtotal(&lines), None);
    }

    #[test]
    fn test_shipping_fee_is_currently_free() {
        assert_eq!(SHIPPING_FEE, Money::ZERO);
    }

    #[test]
    fn test_address_missing_field() {
        let mut address = ShippingAddress {
            full_name: "Asha Rao".into(),
            phone: "+919876543210".into(),
            line1: "12 MG Road".into(),
            line2: None,
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            postal_code: "560001".into(),
            country: "India".into(),
        };
        assert_eq!(address.missing_field(), None);

        address.city = "  ".into();
        assert_eq!(address.missing_field(), Some("city"));

        // line2 is genuinely optional
        address.city = "Bengaluru".into();
        address.line2 = None;
        assert_eq!(address.missing_field(), None);
    }
}
