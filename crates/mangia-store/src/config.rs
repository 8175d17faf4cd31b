//! Store configuration loaded from environment variables.
//!
//! Everything has a sensible default so an embedding application can open
//! the store with zero configuration for local development.

use std::path::PathBuf;

use directories::ProjectDirs;

use crate::error::{Result, StoreError};

/// Store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the SQLite database file.
    /// Env: `MANGIA_DATA_DIR`
    /// Default: the platform data directory, e.g. `~/.local/share/mangia`
    /// on Linux.
    pub data_dir: PathBuf,
}

impl StoreConfig {
    /// Load configuration from environment variables, falling back to the
    /// platform defaults.
    pub fn from_env() -> Result<Self> {
        if let Ok(dir) = std::env::var("MANGIA_DATA_DIR") {
            return Ok(Self {
                data_dir: PathBuf::from(dir),
            });
        }

        let project_dirs =
            ProjectDirs::from("com", "mangia", "mangia").ok_or(StoreError::NoDataDir)?;

        Ok(Self {
            data_dir: project_dirs.data_dir().to_path_buf(),
        })
    }

    /// Full path of the database file inside [`StoreConfig::data_dir`].
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("mangia.db")
    }
}
