//! Domain model structs persisted in the relational store.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to an embedding UI layer. Money is always [`Decimal`] -- totals
//! and subtotals are computed with exact decimal arithmetic, never floats.

use chrono::{DateTime, Utc};
use mangia_shared::{OrderStatus, UserRole};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// A registered account: customer, staff member or deliverer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    /// Unique login name.
    pub username: String,
    /// Salted one-way hash in `salt$digest` hex form. Plaintext passwords
    /// are never stored.
    pub password_hash: String,
    pub role: UserRole,
}

// ---------------------------------------------------------------------------
// Restaurant
// ---------------------------------------------------------------------------

/// A restaurant offering products. Owns its menu: deleting a restaurant
/// removes its products.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub address: String,
    pub phone: String,
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

/// A menu entry belonging to exactly one restaurant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    /// Exact decimal price, stored as a decimal string in SQLite.
    pub price: Decimal,
    pub restaurant_id: i64,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// One line of an order, carrying the fully-resolved [`Product`] it refers
/// to. The product row is resolved at read time, so the price reflects the
/// menu as it is *now*.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product: Product,
    pub quantity: u32,
}

impl OrderItem {
    /// Line subtotal: `price × quantity`, exact.
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// A fully-hydrated order aggregate: placer, restaurant and resolved line
/// items. Items are owned by the order and disappear with it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: i64,
    pub user: User,
    pub restaurant: Restaurant,
    pub status: OrderStatus,
    pub ordered_at: DateTime<Utc>,
    /// Line items in ascending item-id order.
    pub items: Vec<OrderItem>,
    /// Set once a deliverer accepts the order.
    pub deliverer_id: Option<i64>,
}

impl Order {
    /// Order total: sum of the line subtotals, exact.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::subtotal).sum()
    }
}

/// Caller-supplied order line, consumed by `create_order`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub quantity: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: &str) -> Product {
        Product {
            id: 1,
            name: "Margherita".into(),
            description: "Tomato, mozzarella, basil".into(),
            price: price.parse().unwrap(),
            restaurant_id: 1,
        }
    }

    #[test]
    fn subtotal_has_no_rounding_drift() {
        let item = OrderItem {
            id: 1,
            order_id: 1,
            product: product("19.99"),
            quantity: 3,
        };
        assert_eq!(item.subtotal(), "59.97".parse().unwrap());
    }

    #[test]
    fn order_total_sums_line_subtotals() {
        let order = Order {
            id: 1,
            user: User {
                id: 1,
                username: "alice".into(),
                password_hash: String::new(),
                role: mangia_shared::UserRole::Client,
            },
            restaurant: Restaurant {
                id: 1,
                name: "Pizza Place".into(),
                address: "1 Main St".into(),
                phone: "555-0100".into(),
            },
            status: mangia_shared::OrderStatus::Pending,
            ordered_at: chrono::Utc::now(),
            items: vec![
                OrderItem {
                    id: 1,
                    order_id: 1,
                    product: product("12.50"),
                    quantity: 2,
                },
                OrderItem {
                    id: 2,
                    order_id: 1,
                    product: product("0.99"),
                    quantity: 1,
                },
            ],
            deliverer_id: None,
        };
        assert_eq!(order.total(), "25.99".parse().unwrap());
    }

    #[test]
    fn empty_order_totals_zero() {
        let order = Order {
            id: 1,
            user: User {
                id: 1,
                username: "bob".into(),
                password_hash: String::new(),
                role: mangia_shared::UserRole::Client,
            },
            restaurant: Restaurant {
                id: 1,
                name: "Pizza Place".into(),
                address: "1 Main St".into(),
                phone: "555-0100".into(),
            },
            status: mangia_shared::OrderStatus::Pending,
            ordered_at: chrono::Utc::now(),
            items: Vec::new(),
            deliverer_id: None,
        };
        assert_eq!(order.total(), Decimal::ZERO);
    }
}
