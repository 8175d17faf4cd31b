//! Order storage, lifecycle and aggregation.
//!
//! Orders are persisted normalized across `orders` and `order_items`;
//! reading them back is a two-phase materialization: first the raw order
//! rows, then one resolution pass that links users, restaurants and
//! products into full [`Order`] aggregates.
//!
//! Referential gaps are recoverable data conditions, handled uniformly on
//! every read path: an item whose product row no longer exists is skipped
//! with a warning, and an order whose user or restaurant row no longer
//! exists is skipped whole, also with a warning. Within one call each
//! referenced row is fetched at most once.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use mangia_shared::OrderStatus;
use rusqlite::params;
use rust_decimal::Decimal;

use crate::database::Database;
use crate::error::{Result, StoreError, UnknownTag};
use crate::models::{NewOrderItem, Order, OrderItem, Product, Restaurant, User};

const ORDER_COLUMNS: &str = "id, user_id, restaurant_id, status, order_date, deliverer_id";

/// Courier share of a delivered order's total.
fn commission_rate() -> Decimal {
    Decimal::new(10, 2) // 0.10
}

/// Raw `orders` row before resolution.
struct OrderRow {
    id: i64,
    user_id: i64,
    restaurant_id: i64,
    status: OrderStatus,
    ordered_at: DateTime<Utc>,
    deliverer_id: Option<i64>,
}

/// Raw `order_items` row before product resolution.
struct ItemRow {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: u32,
}

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Place a new order for `user_id` at `restaurant_id`.
    ///
    /// The order starts `PENDING` with the current timestamp. Header and
    /// items are written in one transaction, so a partially-persisted order
    /// can never be observed. Fails without persisting anything when the
    /// item list is empty, a quantity is zero, or a line references an
    /// unknown product.
    pub fn create_order(
        &mut self,
        user_id: i64,
        restaurant_id: i64,
        items: &[NewOrderItem],
    ) -> Result<Order> {
        if items.is_empty() {
            return Err(StoreError::EmptyOrder);
        }
        if items.iter().any(|line| line.quantity == 0) {
            return Err(StoreError::InvalidQuantity);
        }

        let user = self.get_user(user_id)?.ok_or(StoreError::NotFound)?;
        let restaurant = self
            .get_restaurant(restaurant_id)?
            .ok_or(StoreError::NotFound)?;

        let mut resolved = Vec::with_capacity(items.len());
        for line in items {
            let product = self
                .get_product(line.product_id)?
                .ok_or(StoreError::UnknownProduct(line.product_id))?;
            resolved.push((product, line.quantity));
        }

        let ordered_at = Utc::now();
        let tx = self.conn_mut().transaction()?;

        tx.execute(
            "INSERT INTO orders (user_id, restaurant_id, status, order_date)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                restaurant_id,
                OrderStatus::Pending.as_str(),
                ordered_at.to_rfc3339(),
            ],
        )?;
        let order_id = tx.last_insert_rowid();

        let mut order_items = Vec::with_capacity(resolved.len());
        {
            // One prepared statement reused for the whole item batch.
            let mut stmt = tx.prepare(
                "INSERT INTO order_items (order_id, product_id, quantity) VALUES (?1, ?2, ?3)",
            )?;
            for (product, quantity) in resolved {
                stmt.execute(params![order_id, product.id, quantity])?;
                order_items.push(OrderItem {
                    id: tx.last_insert_rowid(),
                    order_id,
                    product,
                    quantity,
                });
            }
        }

        tx.commit()?;

        tracing::info!(
            order_id,
            user_id,
            restaurant_id,
            items = order_items.len(),
            "order created"
        );

        Ok(Order {
            id: order_id,
            user,
            restaurant,
            status: OrderStatus::Pending,
            ordered_at,
            items: order_items,
            deliverer_id: None,
        })
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// A deliverer claims a pending order: `PENDING -> IN_PROGRESS`, binding
    /// the deliverer to it.
    ///
    /// The update is conditional on the current status, so of two racing
    /// deliverers exactly one succeeds; the other observes
    /// [`StoreError::InvalidTransition`].
    pub fn accept_order(&self, order_id: i64, deliverer_id: i64) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE orders SET status = ?1, deliverer_id = ?2 WHERE id = ?3 AND status = ?4",
            params![
                OrderStatus::InProgress.as_str(),
                deliverer_id,
                order_id,
                OrderStatus::Pending.as_str(),
            ],
        )?;

        if affected > 0 {
            tracing::info!(order_id, deliverer_id, "order accepted");
            return Ok(());
        }

        match self.order_header(order_id)? {
            Some((status, _)) => Err(StoreError::InvalidTransition {
                order_id,
                status,
                expected: OrderStatus::Pending,
            }),
            None => Err(StoreError::NotFound),
        }
    }

    /// The accepting deliverer marks an order delivered:
    /// `IN_PROGRESS -> DELIVERED`. `DELIVERED` is terminal.
    pub fn complete_delivery(&self, order_id: i64, deliverer_id: i64) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE orders SET status = ?1 WHERE id = ?2 AND status = ?3 AND deliverer_id = ?4",
            params![
                OrderStatus::Delivered.as_str(),
                order_id,
                OrderStatus::InProgress.as_str(),
                deliverer_id,
            ],
        )?;

        if affected > 0 {
            tracing::info!(order_id, deliverer_id, "order delivered");
            return Ok(());
        }

        match self.order_header(order_id)? {
            Some((OrderStatus::InProgress, _)) => {
                Err(StoreError::DelivererMismatch { order_id })
            }
            Some((status, _)) => Err(StoreError::InvalidTransition {
                order_id,
                status,
                expected: OrderStatus::InProgress,
            }),
            None => Err(StoreError::NotFound),
        }
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single order by id, fully hydrated.
    ///
    /// Returns `None` when the order does not exist, or when its user or
    /// restaurant row is gone (the same integrity-gap policy as the list
    /// queries).
    pub fn get_order(&self, id: i64) -> Result<Option<Order>> {
        let rows = self.order_rows(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"),
            params![id],
        )?;
        Ok(self.hydrate_orders(rows)?.pop())
    }

    /// All orders, newest first.
    pub fn list_all_orders(&self) -> Result<Vec<Order>> {
        let rows = self.order_rows(
            &format!("SELECT {ORDER_COLUMNS} FROM orders ORDER BY order_date DESC"),
            [],
        )?;
        self.hydrate_orders(rows)
    }

    /// Orders placed by one user, in insertion order as the store yields
    /// them.
    pub fn orders_for_user(&self, user_id: i64) -> Result<Vec<Order>> {
        let rows = self.order_rows(
            &format!("SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = ?1"),
            params![user_id],
        )?;
        self.hydrate_orders(rows)
    }

    /// Orders in a given status, newest first.
    pub fn orders_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let rows = self.order_rows(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE status = ?1 ORDER BY order_date DESC"
            ),
            params![status.as_str()],
        )?;
        self.hydrate_orders(rows)
    }

    /// Orders assigned to one deliverer (any status), newest first.
    pub fn deliveries_for_deliverer(&self, deliverer_id: i64) -> Result<Vec<Order>> {
        let rows = self.order_rows(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE deliverer_id = ?1
                 ORDER BY order_date DESC"
            ),
            params![deliverer_id],
        )?;
        self.hydrate_orders(rows)
    }

    /// Orders placed on one calendar day, newest first.
    pub fn orders_on_date(&self, date: NaiveDate) -> Result<Vec<Order>> {
        let rows = self.order_rows(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE date(order_date) = ?1
                 ORDER BY order_date DESC"
            ),
            params![date.format("%Y-%m-%d").to_string()],
        )?;
        self.hydrate_orders(rows)
    }

    /// Orders placed in one calendar month, newest first.
    pub fn orders_in_month(&self, year: i32, month: u32) -> Result<Vec<Order>> {
        let rows = self.order_rows(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE strftime('%Y-%m', order_date) = ?1
                 ORDER BY order_date DESC"
            ),
            params![format!("{year:04}-{month:02}")],
        )?;
        self.hydrate_orders(rows)
    }

    // ------------------------------------------------------------------
    // Financial aggregation
    // ------------------------------------------------------------------

    /// Total commission earned by a deliverer: 10% of the total of every
    /// `DELIVERED` order assigned to them. Orders still in flight
    /// contribute nothing.
    pub fn deliverer_earnings(&self, deliverer_id: i64) -> Result<Decimal> {
        let rows = self.order_rows(
            &format!(
                "SELECT {ORDER_COLUMNS} FROM orders WHERE deliverer_id = ?1 AND status = ?2"
            ),
            params![deliverer_id, OrderStatus::Delivered.as_str()],
        )?;
        let orders = self.hydrate_orders(rows)?;

        Ok(orders
            .iter()
            .map(|order| order.total() * commission_rate())
            .sum())
    }

    /// How many order-item rows reference a product, regardless of order
    /// status.
    pub fn product_order_count(&self, product_id: i64) -> Result<u64> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM order_items WHERE product_id = ?1",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Revenue attributed to a product: its current price times the summed
    /// quantity across items of `DELIVERED` orders. A product that no
    /// longer exists has no resolvable price and reports zero.
    pub fn product_revenue(&self, product_id: i64) -> Result<Decimal> {
        let Some(product) = self.get_product(product_id)? else {
            return Ok(Decimal::ZERO);
        };

        let quantity: i64 = self.conn().query_row(
            "SELECT COALESCE(SUM(oi.quantity), 0)
             FROM order_items oi
             JOIN orders o ON o.id = oi.order_id
             WHERE oi.product_id = ?1 AND o.status = ?2",
            params![product_id, OrderStatus::Delivered.as_str()],
            |row| row.get(0),
        )?;

        Ok(product.price * Decimal::from(quantity))
    }

    // ------------------------------------------------------------------
    // Hydration
    // ------------------------------------------------------------------

    fn order_rows<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<OrderRow>> {
        let mut stmt = self.conn().prepare(sql)?;
        let rows = stmt.query_map(params, row_to_order_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Resolve raw order rows into fully-linked aggregates.
    fn hydrate_orders(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>> {
        let mut users: HashMap<i64, Option<User>> = HashMap::new();
        let mut restaurants: HashMap<i64, Option<Restaurant>> = HashMap::new();
        let mut products: HashMap<i64, Option<Product>> = HashMap::new();

        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let Some(user) = cached(&mut users, row.user_id, |id| self.get_user(id))? else {
                tracing::warn!(
                    order_id = row.id,
                    user_id = row.user_id,
                    "order references a missing user, skipping order"
                );
                continue;
            };
            let Some(restaurant) =
                cached(&mut restaurants, row.restaurant_id, |id| self.get_restaurant(id))?
            else {
                tracing::warn!(
                    order_id = row.id,
                    restaurant_id = row.restaurant_id,
                    "order references a missing restaurant, skipping order"
                );
                continue;
            };

            let items = self.load_order_items(row.id, &mut products)?;

            orders.push(Order {
                id: row.id,
                user,
                restaurant,
                status: row.status,
                ordered_at: row.ordered_at,
                items,
                deliverer_id: row.deliverer_id,
            });
        }
        Ok(orders)
    }

    /// Load and resolve the items of one order, ascending by item id.
    fn load_order_items(
        &self,
        order_id: i64,
        products: &mut HashMap<i64, Option<Product>>,
    ) -> Result<Vec<OrderItem>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, order_id, product_id, quantity
             FROM order_items
             WHERE order_id = ?1
             ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![order_id], row_to_item_row)?;

        let mut raw = Vec::new();
        for row in rows {
            raw.push(row?);
        }

        let mut items = Vec::with_capacity(raw.len());
        for row in raw {
            match cached(products, row.product_id, |id| self.get_product(id))? {
                Some(product) => items.push(OrderItem {
                    id: row.id,
                    order_id: row.order_id,
                    product,
                    quantity: row.quantity,
                }),
                None => {
                    tracing::warn!(
                        order_id,
                        product_id = row.product_id,
                        "order item references a missing product, skipping item"
                    );
                }
            }
        }
        Ok(items)
    }

    /// Status and deliverer of one order without hydration. Used to
    /// discriminate "not found" from "illegal transition" after a guarded
    /// update affected zero rows.
    fn order_header(&self, order_id: i64) -> Result<Option<(OrderStatus, Option<i64>)>> {
        match self.conn().query_row(
            "SELECT status, deliverer_id FROM orders WHERE id = ?1",
            params![order_id],
            |row| {
                let tag: String = row.get(0)?;
                let status = OrderStatus::from_tag(&tag).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(UnknownTag(tag)),
                    )
                })?;
                let deliverer_id: Option<i64> = row.get(1)?;
                Ok((status, deliverer_id))
            },
        ) {
            Ok(header) => Ok(Some(header)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch-through cache: each referenced id is resolved at most once per
/// hydration call, absent rows included.
fn cached<T: Clone>(
    cache: &mut HashMap<i64, Option<T>>,
    id: i64,
    fetch: impl FnOnce(i64) -> Result<Option<T>>,
) -> Result<Option<T>> {
    if let Some(hit) = cache.get(&id) {
        return Ok(hit.clone());
    }
    let value = fetch(id)?;
    cache.insert(id, value.clone());
    Ok(value)
}

/// Map a `rusqlite::Row` to an [`OrderRow`].
fn row_to_order_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrderRow> {
    let id: i64 = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let restaurant_id: i64 = row.get(2)?;
    let status_tag: String = row.get(3)?;
    let ordered_str: String = row.get(4)?;
    let deliverer_id: Option<i64> = row.get(5)?;

    let status = OrderStatus::from_tag(&status_tag).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(UnknownTag(status_tag)),
        )
    })?;

    let ordered_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ordered_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(OrderRow {
        id,
        user_id,
        restaurant_id,
        status,
        ordered_at,
        deliverer_id,
    })
}

/// Map a `rusqlite::Row` to an [`ItemRow`].
fn row_to_item_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        id: row.get(0)?,
        order_id: row.get(1)?,
        product_id: row.get(2)?,
        quantity: row.get(3)?,
    })
}
