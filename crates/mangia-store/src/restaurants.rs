//! CRUD operations for [`Restaurant`] records.

use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Restaurant;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new restaurant and return it with its assigned id.
    pub fn create_restaurant(&self, name: &str, address: &str, phone: &str) -> Result<Restaurant> {
        self.conn().execute(
            "INSERT INTO restaurants (name, address, phone) VALUES (?1, ?2, ?3)",
            params![name, address, phone],
        )?;

        Ok(Restaurant {
            id: self.conn().last_insert_rowid(),
            name: name.to_string(),
            address: address.to_string(),
            phone: phone.to_string(),
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single restaurant by id. A missing row is `None`.
    pub fn get_restaurant(&self, id: i64) -> Result<Option<Restaurant>> {
        match self.conn().query_row(
            "SELECT id, name, address, phone FROM restaurants WHERE id = ?1",
            params![id],
            row_to_restaurant,
        ) {
            Ok(restaurant) => Ok(Some(restaurant)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// List all restaurants, ordered by name.
    pub fn list_restaurants(&self) -> Result<Vec<Restaurant>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, address, phone FROM restaurants ORDER BY name ASC")?;
        let rows = stmt.query_map([], row_to_restaurant)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------

    /// Update name, address and phone. Returns `false` if no such
    /// restaurant exists.
    pub fn update_restaurant(&self, restaurant: &Restaurant) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE restaurants SET name = ?1, address = ?2, phone = ?3 WHERE id = ?4",
            params![
                restaurant.name,
                restaurant.address,
                restaurant.phone,
                restaurant.id
            ],
        )?;
        Ok(affected > 0)
    }

    /// Delete a restaurant by id. Its menu goes with it (ON DELETE CASCADE).
    /// Returns `true` if a row was deleted.
    pub fn delete_restaurant(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM restaurants WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`Restaurant`].
fn row_to_restaurant(row: &rusqlite::Row<'_>) -> rusqlite::Result<Restaurant> {
    Ok(Restaurant {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
    })
}
