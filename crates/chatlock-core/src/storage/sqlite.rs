//! SQLite key-value store.
//!
//! A single `kv` table holds one JSON document per key. Values are already
//! ciphertext or fingerprints, so the database file itself is not encrypted.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use tracing::debug;

use super::traits::KeyValueStore;
use crate::error::{LockError, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Durable store backed by a SQLite database file.
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LockError::Persistence(format!(
                    "Cannot create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!(path = %path.display(), "opened sqlite store");

        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LockError::Persistence("SQLite connection poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let conn = self.lock_conn()?;
        let raw: Option<String> = conn
            .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .optional()?;

        match raw {
            Some(text) => serde_json::from_str(&text).map(Some).map_err(|e| {
                LockError::Persistence(format!("Stored value for {} is not JSON: {}", key, e))
            }),
            None => Ok(None),
        }
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<()> {
        let text = serde_json::to_string(value)?;
        let conn = self.lock_conn()?;
        conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, text],
        )?;
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        for key in keys {
            tx.execute("DELETE FROM kv WHERE key = ?", [key])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn data_version(&self) -> Result<Option<i64>> {
        let conn = self.lock_conn()?;
        let version: i64 = conn.query_row("PRAGMA data_version", [], |row| row.get(0))?;
        Ok(Some(version))
    }
}
