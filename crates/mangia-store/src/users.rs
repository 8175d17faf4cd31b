//! Account storage: registration, lookups and authentication.

use mangia_shared::{credentials, UserRole};
use rusqlite::params;

use crate::database::Database;
use crate::error::{Result, StoreError, UnknownTag};
use crate::models::User;

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a new account. The password is hashed with a fresh salt
    /// before it is stored; the plaintext never touches the database.
    pub fn register_user(&self, username: &str, password: &str, role: UserRole) -> Result<User> {
        let password_hash = credentials::hash_password(password);

        self.conn()
            .execute(
                "INSERT INTO users (username, password_hash, role) VALUES (?1, ?2, ?3)",
                params![username, password_hash, role.as_str()],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    StoreError::UsernameTaken(username.to_string())
                }
                other => StoreError::Sqlite(other),
            })?;

        Ok(User {
            id: self.conn().last_insert_rowid(),
            username: username.to_string(),
            password_hash,
            role,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a single user by id. A missing row is `None`, never an error.
    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        match self.conn().query_row(
            "SELECT id, username, password_hash, role FROM users WHERE id = ?1",
            params![id],
            row_to_user,
        ) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// Fetch a single user by their unique username.
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        match self.conn().query_row(
            "SELECT id, username, password_hash, role FROM users WHERE username = ?1",
            params![username],
            row_to_user,
        ) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(other) => Err(StoreError::Sqlite(other)),
        }
    }

    /// List all users, ordered by username.
    pub fn list_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, username, password_hash, role FROM users ORDER BY username ASC",
        )?;
        let rows = stmt.query_map([], row_to_user)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Check a username/password pair against the stored hash.
    ///
    /// Returns the matching user, or `None` when the username is unknown or
    /// the password does not verify. The two cases are deliberately not
    /// distinguishable by the caller.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.get_user_by_username(username)? else {
            return Ok(None);
        };

        if credentials::verify_password(password, &user.password_hash)? {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    // ------------------------------------------------------------------
    // Update / delete
    // ------------------------------------------------------------------

    /// Update username, password hash and role. Returns `false` if no such
    /// user exists.
    pub fn update_user(&self, user: &User) -> Result<bool> {
        let affected = self.conn().execute(
            "UPDATE users SET username = ?1, password_hash = ?2, role = ?3 WHERE id = ?4",
            params![user.username, user.password_hash, user.role.as_str(), user.id],
        )?;
        Ok(affected > 0)
    }

    /// Delete a user by id. Returns `true` if a row was deleted.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Map a `rusqlite::Row` to a [`User`].
fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let id: i64 = row.get(0)?;
    let username: String = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let role_tag: String = row.get(3)?;

    let role = UserRole::from_tag(&role_tag).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            Box::new(UnknownTag(role_tag)),
        )
    })?;

    Ok(User {
        id,
        username,
        password_hash,
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::test_db;

    #[test]
    fn register_and_get() {
        let (_dir, db) = test_db();

        let user = db
            .register_user("alice", "correct horse", UserRole::Client)
            .unwrap();
        assert!(user.id > 0);
        assert_ne!(user.password_hash, "correct horse");

        let fetched = db.get_user(user.id).unwrap().unwrap();
        assert_eq!(fetched, user);

        let by_name = db.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, user.id);

        assert!(db.get_user(9999).unwrap().is_none());
    }

    #[test]
    fn usernames_are_unique() {
        let (_dir, db) = test_db();

        db.register_user("alice", "pw-one", UserRole::Client).unwrap();
        let err = db
            .register_user("alice", "pw-two", UserRole::Deliverer)
            .unwrap_err();
        assert!(matches!(err, StoreError::UsernameTaken(name) if name == "alice"));
    }

    #[test]
    fn authenticate_checks_the_hash() {
        let (_dir, db) = test_db();

        let user = db
            .register_user("bob", "s3cret-pw", UserRole::Deliverer)
            .unwrap();

        let ok = db.authenticate("bob", "s3cret-pw").unwrap().unwrap();
        assert_eq!(ok.id, user.id);

        assert!(db.authenticate("bob", "wrong-pw").unwrap().is_none());
        assert!(db.authenticate("nobody", "s3cret-pw").unwrap().is_none());
    }

    #[test]
    fn update_and_delete_report_whether_a_row_existed() {
        let (_dir, db) = test_db();

        let mut user = db
            .register_user("carol", "initial-pw", UserRole::Employee)
            .unwrap();

        user.username = "caroline".to_string();
        assert!(db.update_user(&user).unwrap());
        assert_eq!(
            db.get_user(user.id).unwrap().unwrap().username,
            "caroline"
        );

        let ghost = User {
            id: 9999,
            ..user.clone()
        };
        assert!(!db.update_user(&ghost).unwrap());

        assert!(db.delete_user(user.id).unwrap());
        assert!(!db.delete_user(user.id).unwrap());
        assert!(db.get_user(user.id).unwrap().is_none());
    }

    #[test]
    fn list_users_is_sorted_by_username() {
        let (_dir, db) = test_db();

        db.register_user("zoe", "password-z", UserRole::Client).unwrap();
        db.register_user("adam", "password-a", UserRole::Client).unwrap();

        let names: Vec<String> = db
            .list_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, vec!["adam".to_string(), "zoe".to_string()]);
    }
}
