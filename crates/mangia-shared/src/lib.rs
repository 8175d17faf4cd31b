//! # mangia-shared
//!
//! Domain vocabulary shared across the Mangia crates: account roles, the
//! order status lifecycle, and salted one-way password hashing.
//!
//! Everything here is storage-agnostic; the store crate maps these types to
//! and from their SQLite representations.

pub mod credentials;
pub mod types;

mod error;

pub use error::CredentialsError;
pub use types::{OrderStatus, UserRole};
