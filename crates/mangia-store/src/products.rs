//! CRUD operations for [`Product`] records, plus the popularity ranking.

use rusqlite::params;
use rust_decimal::Decimal;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Product;

/// How many products the popularity ranking returns.
const POPULAR_LIMIT: u32 = 10;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new product and return it with its assigned id.
    pub fn create_product(
        &self,
        name: &str,
        description: &str,
        price: Decimal,
        restaurant_id: i64,
    ) -> Result<Product> {
        self.conn().execute(
            "INSERT INTO products (name, description, price, restaurant_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![name, description, price.to_string(), restaurant_id],
        )?;

        Ok(Product {
            id: self.conn().last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
            price,
            restaurant_id,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single product by id. A missing row is `None`, never an
    /// error -- order hydration relies on this to treat a dangling product
    /// reference as a data gap rather than a crash.
    pub fn get_product(&self, id: i64) -> Result<Option<Product>> {
        match self.conn().query_row(
            "SELECT id, name, description, price, restaurant_id FROM products WHERE id = ?1",
            params![id],
            row_to_product,
        ) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// List all products.
    pub fn list_products(&self) -> Result<Vec<Product>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, description, price, restaurant_id FROM products")?;
        let rows = stmt.query_map([], row_to_product)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// List the menu of a specific restaurant.
    pub fn list_products_for_restaurant(&self, restaurant_id: i64) -> Result<Vec<Product>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, name, description, price, restaurant_id
             FROM products
             WHERE restaurant_id = ?1",
        )?;
        let rows = stmt.query_map(params![restaurant_id], row_to_product)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// The ten most-ordered products, ranked by how many order-item rows
    /// reference them (any order status). Ties resolve by product id
    /// ascending.
    pub fn popular_products(&self) -> Result<Vec<Product>> {
        let mut stmt = self.conn().prepare(
            "SELECT p.id, p.name, p.description, p.price, p.restaurant_id
             FROM products p
             LEFT JOIN order_items oi ON oi.product_id = p.id
             GROUP BY p.id
             ORDER BY COUNT(oi.id) DESC, p.id ASC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![POPULAR_LIMIT], row_to_product)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------

    /// Update name, description, price and restaurant. Returns `false` if
    /// no such product exists.
    pub fn update_product(&self, product: &Product) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE products SET name = ?1, description = ?2, price = ?3, restaurant_id = ?4
             WHERE id = ?5",
            params![
                product.name,
                product.description,
                product.price.to_string(),
                product.restaurant_id,
                product.id
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete a product by id. Returns `true` if a row was deleted.
    ///
    /// Order items that referenced it become dangling and are skipped (with
    /// a warning) the next time their order is hydrated.
    pub fn delete_product(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Product`].
fn row_to_product(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    let id: i64 = row.get(0)?;
    let name: String = row.get(1)?;
    let description: String = row.get(2)?;
    let price_str: String = row.get(3)?;
    let restaurant_id: i64 = row.get(4)?;

    let price: Decimal = price_str.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Product {
        id,
        name,
        description,
        price,
        restaurant_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewOrderItem;
    use crate::testutil::test_db;
    use mangia_shared::UserRole;

    #[test]
    fn crud_round_trip_keeps_the_price_exact() {
        let (_dir, db) = test_db();

        let restaurant = db
            .create_restaurant("Pizza Place", "1 Main St", "555-0100")
            .unwrap();
        let mut product = db
            .create_product(
                "Margherita",
                "Tomato, mozzarella, basil",
                "12.50".parse().unwrap(),
                restaurant.id,
            )
            .unwrap();

        let fetched = db.get_product(product.id).unwrap().unwrap();
        assert_eq!(fetched, product);
        assert_eq!(fetched.price, "12.50".parse().unwrap());

        product.price = "13.25".parse().unwrap();
        assert!(db.update_product(&product).unwrap());
        assert_eq!(
            db.get_product(product.id).unwrap().unwrap().price,
            "13.25".parse().unwrap()
        );

        assert!(db.delete_product(product.id).unwrap());
        assert!(!db.delete_product(product.id).unwrap());
        assert!(db.get_product(product.id).unwrap().is_none());
    }

    #[test]
    fn menu_listing_filters_by_restaurant() {
        let (_dir, db) = test_db();

        let pizza = db
            .create_restaurant("Pizza Place", "1 Main St", "555-0100")
            .unwrap();
        let burgers = db
            .create_restaurant("Burger Barn", "2 High St", "555-0101")
            .unwrap();

        db.create_product("Margherita", "", "12.50".parse().unwrap(), pizza.id)
            .unwrap();
        db.create_product("Diavola", "", "14.00".parse().unwrap(), pizza.id)
            .unwrap();
        db.create_product("Cheeseburger", "", "9.90".parse().unwrap(), burgers.id)
            .unwrap();

        let menu = db.list_products_for_restaurant(pizza.id).unwrap();
        assert_eq!(menu.len(), 2);
        assert!(menu.iter().all(|p| p.restaurant_id == pizza.id));

        assert_eq!(db.list_products().unwrap().len(), 3);
    }

    #[test]
    fn popularity_ranks_by_reference_count_with_id_tiebreak() {
        let (_dir, mut db) = test_db();

        let client = db
            .register_user("alice", "password-1", UserRole::Client)
            .unwrap();
        let restaurant = db
            .create_restaurant("Pizza Place", "1 Main St", "555-0100")
            .unwrap();

        let a = db
            .create_product("Margherita", "", "12.50".parse().unwrap(), restaurant.id)
            .unwrap();
        let b = db
            .create_product("Diavola", "", "14.00".parse().unwrap(), restaurant.id)
            .unwrap();
        let c = db
            .create_product("Quattro Formaggi", "", "15.00".parse().unwrap(), restaurant.id)
            .unwrap();

        // Item-reference counts: A x5, B x3, C x3. Quantity is irrelevant
        // to popularity; only row counts matter.
        let mut lines = Vec::new();
        for _ in 0..5 {
            lines.push(NewOrderItem {
                product_id: a.id,
                quantity: 1,
            });
        }
        for _ in 0..3 {
            lines.push(NewOrderItem {
                product_id: b.id,
                quantity: 7,
            });
            lines.push(NewOrderItem {
                product_id: c.id,
                quantity: 1,
            });
        }
        db.create_order(client.id, restaurant.id, &lines).unwrap();

        let ranked = db.popular_products().unwrap();
        let ids: Vec<i64> = ranked.iter().map(|p| p.id).collect();

        // A first; B and C tie on 3 references and resolve by id ascending.
        assert!(b.id < c.id);
        assert_eq!(ids, vec![a.id, b.id, c.id]);
    }

    #[test]
    fn popularity_is_capped_at_ten() {
        let (_dir, db) = test_db();

        let restaurant = db
            .create_restaurant("Pizza Place", "1 Main St", "555-0100")
            .unwrap();
        for i in 0..12 {
            db.create_product(
                &format!("Pizza #{i}"),
                "",
                "10.00".parse().unwrap(),
                restaurant.id,
            )
            .unwrap();
        }

        assert_eq!(db.popular_products().unwrap().len(), 10);
    }
}
