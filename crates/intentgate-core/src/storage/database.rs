//! SQLite-backed state store.
//!
//! Each top-level state field (`activeSites`, `whitelistedSites`, ...) is one
//! row of a `kv` table holding its JSON value. A partial `set` upserts only
//! the fields it carries, inside one transaction.

use std::path::Path;

use rusqlite::{params, Connection};

use super::{data_dir, StateStore, StoredState};
use crate::error::{Result, StorageError};

/// SQLite database for persisted gating state.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the store at `<data dir>/intentgate.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("intentgate.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a raw value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl StateStore for SqliteStore {
    fn get(&self) -> Result<StoredState> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM kv")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut fields = serde_json::Map::new();
        for row in rows {
            let (key, raw) = row?;
            let value = serde_json::from_str(&raw).map_err(|e| StorageError::Malformed {
                field: key.clone(),
                message: e.to_string(),
            })?;
            fields.insert(key, value);
        }
        Ok(serde_json::from_value(serde_json::Value::Object(fields))?)
    }

    fn set(&mut self, partial: &StoredState) -> Result<()> {
        let serde_json::Value::Object(fields) = serde_json::to_value(partial)? else {
            return Ok(());
        };
        let tx = self.conn.transaction()?;
        for (key, value) in &fields {
            tx.execute(
                "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
                params![key, value.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}
