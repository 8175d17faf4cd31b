use mangia_shared::OrderStatus;
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A mutation targeted a row that does not exist.
    ///
    /// Lookups never return this; a missing row on a read path is `None`.
    #[error("Record not found")]
    NotFound,

    /// Registration with a username that is already taken.
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// `create_order` called with no items.
    #[error("An order must contain at least one item")]
    EmptyOrder,

    /// An order line with a zero quantity.
    #[error("Order item quantity must be at least 1")]
    InvalidQuantity,

    /// An order line referencing a product that does not exist.
    #[error("Product {0} does not exist")]
    UnknownProduct(i64),

    /// A status change that the lifecycle does not allow.
    #[error("Order {order_id} is {status}, expected {expected}")]
    InvalidTransition {
        order_id: i64,
        status: OrderStatus,
        expected: OrderStatus,
    },

    /// Completion attempted by a deliverer the order is not assigned to.
    #[error("Order {order_id} is assigned to a different deliverer")]
    DelivererMismatch { order_id: i64 },

    /// Timestamp parse error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// Stored credential hash could not be interpreted.
    #[error("Credentials error: {0}")]
    Credentials(#[from] mangia_shared::CredentialsError),
}

/// Raised from row mappers when a text tag does not map to a known enum.
#[derive(Error, Debug)]
#[error("Unknown tag: {0}")]
pub(crate) struct UnknownTag(pub String);

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
