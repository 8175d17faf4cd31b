//! # mangia-store
//!
//! Relational storage for the Mangia food-ordering system, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model, the order materialization and aggregation layer, and read-only
//! reporting views. The handle is constructed explicitly by the embedding
//! application and borrowed by each operation -- there is no global
//! connection state.

pub mod config;
pub mod database;
pub mod migrations;
pub mod models;
pub mod orders;
pub mod products;
pub mod reports;
pub mod restaurants;
pub mod snapshot;
pub mod users;

mod error;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::StoreConfig;
pub use database::Database;
pub use error::StoreError;
pub use models::*;
