//! Storage layer for the Paylane protocol.
//!
//! This crate persists the two pieces of state the protocol owns:
//!
//! - **Ledger** (`LedgerStore`): content entries and licenses
//! - **Purchase log** (`PurchaseLog`): append-only record of confirmed settlements
//!
//! Each has an in-memory implementation for tests and embedded engines, and
//! a SQLite implementation sharing one database file.
//!
//! # Storage Layout
//!
//! ```text
//! ~/.paylane/
//! ├── config.toml              # CLI configuration
//! └── paylane.db               # SQLite: content, licenses, purchases
//! ```
//!
//! # Example
//!
//! ```
//! use paylane_store::{LedgerDatabase, LedgerStore};
//! use paylane_types::{ContentEntry, Fingerprint, Identity};
//!
//! let db = LedgerDatabase::open_in_memory().unwrap();
//! let mut ledger = db.ledger();
//!
//! let entry = ContentEntry::new(Fingerprint::of(b"doc"), 100, "ipfs://doc", Identity::new("alice"), 1);
//! ledger.insert_content(&entry).unwrap();
//! assert!(ledger.get_content(&entry.fingerprint).unwrap().is_some());
//! ```

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::{MemoryLedgerStore, MemoryPurchaseLog};
pub use sqlite::{SqliteLedgerStore, SqlitePurchaseLog};
pub use traits::{LedgerStore, PurchaseLog};

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

/// Get the default data directory for Paylane state.
///
/// Priority:
/// 1. `PAYLANE_DATA_DIR` environment variable (if set)
/// 2. Platform-specific data directory
/// 3. Fallback to `$HOME/.paylane`
pub fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PAYLANE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    directories::ProjectDirs::from("io", "paylane", "paylane")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| {
            std::env::var("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(".paylane")
        })
}

/// Where the database lives.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Base directory for all data.
    pub base_dir: PathBuf,
    /// Database file path (default: base_dir/paylane.db).
    pub database_path: Option<PathBuf>,
}

impl StoreConfig {
    /// Create a new configuration with the given base directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            database_path: None,
        }
    }

    /// Set the database path.
    pub fn with_database_path(mut self, path: impl AsRef<Path>) -> Self {
        self.database_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Get the database path.
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.base_dir.join("paylane.db"))
    }
}

/// An opened database handing out stores over one shared connection.
pub struct LedgerDatabase {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerDatabase {
    /// Open (or create) the database described by `config`.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        tracing::info!(db_path = %db_path.display(), "Opening ledger database");
        let conn = Connection::open(&db_path)?;
        schema::initialize_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Ledger store over this database.
    pub fn ledger(&self) -> SqliteLedgerStore {
        SqliteLedgerStore::new(Arc::clone(&self.conn))
    }

    /// Purchase log over this database.
    pub fn purchases(&self) -> SqlitePurchaseLog {
        SqlitePurchaseLog::new(Arc::clone(&self.conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_config_paths() {
        let config = StoreConfig::new("/tmp/paylane");
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/paylane/paylane.db")
        );

        let config = config.with_database_path("/var/db/ledger.db");
        assert_eq!(config.database_path(), PathBuf::from("/var/db/ledger.db"));
    }

    #[test]
    fn test_open_in_memory() {
        let db = LedgerDatabase::open_in_memory().unwrap();
        assert_eq!(db.purchases().count().unwrap(), 0);
    }
}
