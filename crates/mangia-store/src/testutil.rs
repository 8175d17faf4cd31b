//! Shared helpers for in-crate tests.

use crate::database::Database;

/// Open a fresh database in its own temp directory.
///
/// The directory guard must be kept alive for the lifetime of the database.
pub(crate) fn test_db() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Database::open_at(&dir.path().join("test.db")).expect("open test db");
    (dir, db)
}
