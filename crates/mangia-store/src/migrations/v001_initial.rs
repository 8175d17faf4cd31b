//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `restaurants`, `products`,
//! `orders`, and `order_items`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
///
/// Only `order_items.order_id` and `products.restaurant_id` carry enforced
/// foreign keys: items are a composition of their order and a menu is a
/// composition of its restaurant. Orders reference users, restaurants and
/// products loosely -- those rows are independently managed and may be
/// edited or removed after the fact, so they are resolved at read time and
/// a gap is handled there.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,              -- salted one-way hash, `salt$digest` hex
    role          TEXT NOT NULL               -- CLIENT | EMPLOYEE | DELIVERER
);

-- ----------------------------------------------------------------
-- Restaurants
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS restaurants (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    address TEXT NOT NULL,
    phone   TEXT NOT NULL
);

-- ----------------------------------------------------------------
-- Products
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS products (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    description   TEXT NOT NULL,
    price         TEXT NOT NULL,              -- exact decimal string
    restaurant_id INTEGER NOT NULL,

    FOREIGN KEY (restaurant_id) REFERENCES restaurants(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_products_restaurant_id ON products(restaurant_id);

-- ----------------------------------------------------------------
-- Orders
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS orders (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL,           -- loose ref -> users(id)
    restaurant_id INTEGER NOT NULL,           -- loose ref -> restaurants(id)
    status        TEXT NOT NULL,              -- PENDING | IN_PROGRESS | DELIVERED
    order_date    TEXT NOT NULL,              -- ISO-8601 / RFC-3339
    deliverer_id  INTEGER                     -- nullable, loose ref -> users(id)
);

CREATE INDEX IF NOT EXISTS idx_orders_date ON orders(order_date DESC);
CREATE INDEX IF NOT EXISTS idx_orders_user_id ON orders(user_id);
CREATE INDEX IF NOT EXISTS idx_orders_status ON orders(status);
CREATE INDEX IF NOT EXISTS idx_orders_deliverer_id ON orders(deliverer_id);

-- ----------------------------------------------------------------
-- Order items
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS order_items (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    order_id   INTEGER NOT NULL,
    product_id INTEGER NOT NULL,              -- loose ref -> products(id)
    quantity   INTEGER NOT NULL CHECK (quantity >= 1),

    FOREIGN KEY (order_id) REFERENCES orders(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_order_items_order_id ON order_items(order_id);
CREATE INDEX IF NOT EXISTS idx_order_items_product_id ON order_items(product_id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
