//! In-memory key-value store.

use std::collections::HashMap;

use serde_json::Value;

use super::traits::KeyValueStore;
use crate::error::{LockError, Result};

/// Volatile store backed by a `HashMap`.
///
/// Useful in tests and for session-only use. `fail_writes` makes every
/// mutation return `LockError::Persistence`, which exercises the
/// best-effort paths of the vault.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, Value>,
    fail_writes: bool,
    version: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set`/`remove` calls fail.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Replace a value as if another writer had done it.
    pub fn write_external(&mut self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
        self.version += 1;
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            return Err(LockError::Persistence(
                "memory store is read-only".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<()> {
        self.check_writable()?;
        self.values.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove(&mut self, keys: &[&str]) -> Result<()> {
        self.check_writable()?;
        for key in keys {
            self.values.remove(*key);
        }
        Ok(())
    }

    fn data_version(&self) -> Result<Option<i64>> {
        Ok(Some(self.version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_get_remove() {
        let mut store = MemoryStore::new();
        store.set("pinKey", &json!("abc")).unwrap();
        assert_eq!(store.get("pinKey").unwrap(), Some(json!("abc")));

        store.remove(&["pinKey", "missing"]).unwrap();
        assert_eq!(store.get("pinKey").unwrap(), None);
    }

    #[test]
    fn test_fail_writes() {
        let mut store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(matches!(
            store.set("k", &json!(1)),
            Err(LockError::Persistence(_))
        ));
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_external_write_bumps_version() {
        let mut store = MemoryStore::new();
        let before = store.data_version().unwrap();
        store.write_external("lockedChats", json!({}));
        assert_ne!(store.data_version().unwrap(), before);
    }
}
