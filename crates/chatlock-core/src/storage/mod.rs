//! Persistence providers and the typed layout stored in them.
//!
//! The store holds a handful of top-level keys:
//! - `pinKey`: fingerprint of the current PIN
//! - `pinUpdatedAt`: when the PIN was last set (ms since epoch)
//! - `lockedChats`: map of lock key to `LockedEntry`
//! - `lockedChat`: a single legacy entry, migrated into `lockedChats` once

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::KeyValueStore;

use serde_json::Value;
use tracing::{info, warn};

use crate::crypto::Fingerprint;
use crate::error::{LockError, Result};
use crate::types::{LockedEntry, VaultMap};

pub const PIN_KEY: &str = "pinKey";
pub const PIN_UPDATED_AT_KEY: &str = "pinUpdatedAt";
pub const LOCKED_CHATS_KEY: &str = "lockedChats";
pub const LEGACY_LOCKED_CHAT_KEY: &str = "lockedChat";

/// Read the stored PIN fingerprint, if one has been set.
pub fn load_fingerprint(store: &dyn KeyValueStore) -> Result<Option<Fingerprint>> {
    match store.get(PIN_KEY)? {
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(Fingerprint::from_stored(s))),
        Some(Value::Null) | None => Ok(None),
        Some(Value::String(_)) => Ok(None),
        Some(other) => Err(LockError::Persistence(format!(
            "{} has unexpected type: {}",
            PIN_KEY,
            json_type(&other)
        ))),
    }
}

/// Read the time the PIN was last set.
pub fn load_pin_updated_at(store: &dyn KeyValueStore) -> Result<Option<i64>> {
    Ok(store.get(PIN_UPDATED_AT_KEY)?.and_then(|v| v.as_i64()))
}

/// Load the vault map, lifting a legacy single entry into it if needed.
///
/// Entries that fail to parse are skipped with a warning so one damaged
/// record cannot hide the rest. Entries missing their `lockKey` take it from
/// the map key.
pub fn load_vault(store: &mut dyn KeyValueStore) -> Result<VaultMap> {
    match store.get(LOCKED_CHATS_KEY)? {
        Some(Value::Object(map)) => {
            let mut vault = VaultMap::with_capacity(map.len());
            for (key, raw) in map {
                match serde_json::from_value::<LockedEntry>(raw) {
                    Ok(mut entry) => {
                        if entry.lock_key.is_empty() {
                            entry.lock_key = key.clone();
                        }
                        vault.insert(key, entry);
                    }
                    Err(e) => warn!(lock_key = %key, error = %e, "skipping unreadable vault entry"),
                }
            }
            Ok(vault)
        }
        Some(Value::Null) | None => migrate_legacy(store),
        Some(other) => Err(LockError::Persistence(format!(
            "{} has unexpected type: {}",
            LOCKED_CHATS_KEY,
            json_type(&other)
        ))),
    }
}

fn migrate_legacy(store: &mut dyn KeyValueStore) -> Result<VaultMap> {
    let Some(raw) = store.get(LEGACY_LOCKED_CHAT_KEY)? else {
        return Ok(VaultMap::new());
    };

    let mut entry: LockedEntry = match serde_json::from_value(raw) {
        Ok(entry) => entry,
        Err(e) => {
            warn!(error = %e, "legacy locked chat is unreadable, ignoring");
            return Ok(VaultMap::new());
        }
    };
    let Some(conversation_id) = entry.conversation_id.clone() else {
        return Ok(VaultMap::new());
    };
    if entry.lock_key.is_empty() {
        entry.lock_key = conversation_id.clone();
    }

    let mut vault = VaultMap::new();
    vault.insert(conversation_id.clone(), entry);
    let persisted = save_vault(store, &vault).and_then(|()| store.remove(&[LEGACY_LOCKED_CHAT_KEY]));
    match persisted {
        Ok(()) => info!(conversation_id = %conversation_id, "migrated legacy locked chat"),
        Err(e) => warn!(error = %e, "legacy migration not persisted, will retry next load"),
    }
    Ok(vault)
}

/// Persist the whole vault map under `lockedChats`.
pub fn save_vault(store: &mut dyn KeyValueStore, vault: &VaultMap) -> Result<()> {
    let value = serde_json::to_value(vault)?;
    store.set(LOCKED_CHATS_KEY, &value)
}

/// Forget the PIN and every locked entry, as a fresh install does.
pub fn reset(store: &mut dyn KeyValueStore) -> Result<()> {
    store.remove(&[PIN_KEY, LEGACY_LOCKED_CHAT_KEY, LOCKED_CHATS_KEY])?;
    info!("cleared PIN and vault");
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
