//! Full-store snapshot export/import.
//!
//! The snapshot is a plain serde payload (JSON-friendly) holding every
//! table row, with orders kept in their normalized form -- ids, status tags
//! and timestamps exactly as stored, dangling references included. Import
//! merges with `INSERT OR IGNORE`, so restoring into a non-empty store
//! never overwrites existing rows.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Result;
use crate::models::{Product, Restaurant, User};

/// Full store snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// ISO 8601 timestamp of when the snapshot was created.
    pub created_at: String,
    /// Crate version that produced the snapshot.
    pub version: String,
    pub users: Vec<User>,
    pub restaurants: Vec<Restaurant>,
    pub products: Vec<Product>,
    pub orders: Vec<SnapshotOrder>,
}

/// Normalized order row in a snapshot, references by id like the schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOrder {
    pub id: i64,
    pub user_id: i64,
    pub restaurant_id: i64,
    pub status: String,
    pub order_date: String,
    pub deliverer_id: Option<i64>,
    pub items: Vec<SnapshotOrderItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotOrderItem {
    pub id: i64,
    pub product_id: i64,
    pub quantity: u32,
}

/// Per-table row counts of an import.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ImportStats {
    pub users_imported: usize,
    pub restaurants_imported: usize,
    pub products_imported: usize,
    pub orders_imported: usize,
    pub items_imported: usize,
}

impl Database {
    /// Export every table into a serializable snapshot.
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        let users = self.list_users()?;
        let restaurants = self.list_restaurants()?;
        let products = self.list_products()?;

        let mut stmt = self.conn().prepare(
            "SELECT id, user_id, restaurant_id, status, order_date, deliverer_id
             FROM orders ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SnapshotOrder {
                id: row.get(0)?,
                user_id: row.get(1)?,
                restaurant_id: row.get(2)?,
                status: row.get(3)?,
                order_date: row.get(4)?,
                deliverer_id: row.get(5)?,
                items: Vec::new(),
            })
        })?;

        let mut orders = Vec::new();
        for row in rows {
            let mut order = row?;
            order.items = self.snapshot_items(order.id)?;
            orders.push(order);
        }

        Ok(Snapshot {
            created_at: chrono::Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            users,
            restaurants,
            products,
            orders,
        })
    }

    /// Import a snapshot, merging with existing data (`INSERT OR IGNORE`).
    pub fn import_snapshot(&self, snapshot: &Snapshot) -> Result<ImportStats> {
        let mut stats = ImportStats::default();

        for user in &snapshot.users {
            let res = self.conn().execute(
                "INSERT OR IGNORE INTO users (id, username, password_hash, role)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.id,
                    user.username,
                    user.password_hash,
                    user.role.as_str()
                ],
            );
            if matches!(res, Ok(1)) {
                stats.users_imported += 1;
            }
        }

        for restaurant in &snapshot.restaurants {
            let res = self.conn().execute(
                "INSERT OR IGNORE INTO restaurants (id, name, address, phone)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    restaurant.id,
                    restaurant.name,
                    restaurant.address,
                    restaurant.phone
                ],
            );
            if matches!(res, Ok(1)) {
                stats.restaurants_imported += 1;
            }
        }

        for product in &snapshot.products {
            let res = self.conn().execute(
                "INSERT OR IGNORE INTO products (id, name, description, price, restaurant_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    product.id,
                    product.name,
                    product.description,
                    product.price.to_string(),
                    product.restaurant_id
                ],
            );
            if matches!(res, Ok(1)) {
                stats.products_imported += 1;
            }
        }

        for order in &snapshot.orders {
            // A snapshot produced elsewhere can carry garbage; reject bad
            // timestamps before they poison the date-scoped queries.
            chrono::DateTime::parse_from_rfc3339(&order.order_date)?;

            let res = self.conn().execute(
                "INSERT OR IGNORE INTO orders (id, user_id, restaurant_id, status, order_date, deliverer_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    order.id,
                    order.user_id,
                    order.restaurant_id,
                    order.status,
                    order.order_date,
                    order.deliverer_id
                ],
            );
            if matches!(res, Ok(1)) {
                stats.orders_imported += 1;
            }

            for item in &order.items {
                let res = self.conn().execute(
                    "INSERT OR IGNORE INTO order_items (id, order_id, product_id, quantity)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![item.id, order.id, item.product_id, item.quantity],
                );
                if matches!(res, Ok(1)) {
                    stats.items_imported += 1;
                }
            }
        }

        Ok(stats)
    }

    fn snapshot_items(&self, order_id: i64) -> Result<Vec<SnapshotOrderItem>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, product_id, quantity FROM order_items
             WHERE order_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map(params![order_id], |row| {
            Ok(SnapshotOrderItem {
                id: row.get(0)?,
                product_id: row.get(1)?,
                quantity: row.get(2)?,
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOrderItem;
    use crate::testutil::test_db;
    use mangia_shared::UserRole;

    #[test]
    fn export_import_round_trip() {
        let (_dir, mut db) = test_db();

        let client = db
            .register_user("alice", "client-pw-1", UserRole::Client)
            .unwrap();
        let deliverer = db
            .register_user("dora", "deliverer-pw-1", UserRole::Deliverer)
            .unwrap();
        let restaurant = db
            .create_restaurant("Pizza Place", "1 Main St", "555-0100")
            .unwrap();
        let product = db
            .create_product("Margherita", "", "12.50".parse().unwrap(), restaurant.id)
            .unwrap();

        let order = db
            .create_order(
                client.id,
                restaurant.id,
                &[NewOrderItem {
                    product_id: product.id,
                    quantity: 2,
                }],
            )
            .unwrap();
        db.accept_order(order.id, deliverer.id).unwrap();
        db.complete_delivery(order.id, deliverer.id).unwrap();

        let snapshot = db.export_snapshot().unwrap();

        // Snapshots survive a JSON round trip unchanged.
        let json = serde_json::to_string(&snapshot).unwrap();
        let snapshot: Snapshot = serde_json::from_str(&json).unwrap();

        let (_dir2, other) = test_db();
        let stats = other.import_snapshot(&snapshot).unwrap();
        assert_eq!(stats.users_imported, 2);
        assert_eq!(stats.restaurants_imported, 1);
        assert_eq!(stats.products_imported, 1);
        assert_eq!(stats.orders_imported, 1);
        assert_eq!(stats.items_imported, 1);

        let restored = other.get_order(order.id).unwrap().unwrap();
        assert_eq!(restored.total(), "25.00".parse().unwrap());
        assert_eq!(restored.deliverer_id, Some(deliverer.id));
        assert_eq!(
            other.deliverer_earnings(deliverer.id).unwrap(),
            "2.50".parse().unwrap()
        );

        // Hashes travel with the snapshot, so credentials still verify.
        assert!(other.authenticate("alice", "client-pw-1").unwrap().is_some());
    }

    #[test]
    fn import_is_a_merge_not_an_overwrite() {
        let (_dir, db) = test_db();

        db.register_user("alice", "client-pw-1", UserRole::Client)
            .unwrap();
        let snapshot = db.export_snapshot().unwrap();

        // Re-importing into the same store touches nothing.
        let stats = db.import_snapshot(&snapshot).unwrap();
        assert_eq!(stats.users_imported, 0);
        assert_eq!(db.list_users().unwrap().len(), 1);
    }
}
