//! Key-value store trait definition.
//!
//! The `KeyValueStore` trait is the only thing the vault needs from a
//! persistence provider: get, set and remove JSON values under string keys.
//! This lets Chatlock run against SQLite on disk or a plain in-memory map
//! without changing the lock flow.

use serde_json::Value;

use crate::error::Result;

/// Persistence provider interface.
///
/// Implementations must ensure:
/// - A `set` is durable (or has failed) before it returns
/// - Values round-trip exactly as JSON
/// - Removing an absent key is not an error
pub trait KeyValueStore: Send {
    /// Read the value stored under `key`.
    ///
    /// # Returns
    ///
    /// Returns `Ok(None)` when nothing is stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `LockError::Persistence` if the backend cannot be read or the
    /// stored value is not valid JSON.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &Value) -> Result<()>;

    /// Remove every key in `keys`.
    fn remove(&mut self, keys: &[&str]) -> Result<()>;

    /// Counter that moves when another writer changes the backing store.
    ///
    /// Providers that cannot observe outside writers return `Ok(None)`.
    fn data_version(&self) -> Result<Option<i64>> {
        Ok(None)
    }
}
