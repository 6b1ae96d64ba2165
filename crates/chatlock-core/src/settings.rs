//! PIN settings: setting, verifying and describing the stored PIN.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::crypto::{hash_pin, validate_pin, Fingerprint, PinPolicy};
use crate::error::{LockError, Result};
use crate::storage::{self, KeyValueStore, PIN_KEY, PIN_UPDATED_AT_KEY};

/// Whether a PIN is configured, and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinStatus {
    pub is_set: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Validate and store a new PIN.
///
/// Surrounding whitespace is trimmed before validation so the stored
/// fingerprint matches what `verify_pin` later computes. Existing vault
/// entries stay sealed under the previous fingerprint.
pub fn set_pin(
    store: &mut dyn KeyValueStore,
    pin: &str,
    confirm: &str,
    policy: &PinPolicy,
) -> Result<Fingerprint> {
    let pin = pin.trim();
    validate_pin(pin, confirm.trim(), policy)?;

    let fingerprint = hash_pin(pin);
    let had_pin = storage::load_fingerprint(store)?.is_some();

    store.set(PIN_KEY, &Value::String(fingerprint.as_str().to_string()))?;
    store.set(
        PIN_UPDATED_AT_KEY,
        &Value::from(Utc::now().timestamp_millis()),
    )?;

    if had_pin {
        info!("PIN updated");
    } else {
        info!("PIN set");
    }
    Ok(fingerprint)
}

/// Check a submitted PIN against the stored fingerprint.
///
/// # Returns
///
/// The stored fingerprint, for use as key material.
///
/// # Errors
///
/// - `InvalidInput` if the PIN is empty after trimming
/// - `PinNotSet` if no fingerprint is stored
/// - `WrongPin` if the fingerprints differ
pub fn verify_pin(store: &dyn KeyValueStore, pin: &str) -> Result<Fingerprint> {
    let trimmed = pin.trim();
    if trimmed.is_empty() {
        return Err(LockError::InvalidInput("Enter your PIN.".to_string()));
    }

    let stored = storage::load_fingerprint(store)?.ok_or(LockError::PinNotSet)?;
    if hash_pin(trimmed) != stored {
        warn!("PIN verification failed");
        return Err(LockError::WrongPin);
    }
    Ok(stored)
}

pub fn pin_status(store: &dyn KeyValueStore) -> Result<PinStatus> {
    let is_set = storage::load_fingerprint(store)?.is_some();
    let updated_at = storage::load_pin_updated_at(store)?
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single());
    Ok(PinStatus { is_set, updated_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_set_then_verify() {
        let mut store = MemoryStore::new();
        let stored = set_pin(&mut store, "4242", "4242", &PinPolicy::default()).unwrap();
        assert_eq!(stored, hash_pin("4242"));

        let verified = verify_pin(&store, " 4242 ").unwrap();
        assert_eq!(verified, stored);
    }

    #[test]
    fn test_verify_wrong_pin() {
        let mut store = MemoryStore::new();
        set_pin(&mut store, "4242", "4242", &PinPolicy::default()).unwrap();
        assert!(matches!(
            verify_pin(&store, "0000"),
            Err(LockError::WrongPin)
        ));
    }

    #[test]
    fn test_verify_without_pin() {
        let store = MemoryStore::new();
        assert!(matches!(
            verify_pin(&store, "4242"),
            Err(LockError::PinNotSet)
        ));
    }

    #[test]
    fn test_verify_empty_input() {
        let store = MemoryStore::new();
        let err = verify_pin(&store, "   ").unwrap_err();
        assert_eq!(err.to_string(), "Invalid input: Enter your PIN.");
    }

    #[test]
    fn test_set_pin_rejects_short() {
        let mut store = MemoryStore::new();
        assert!(set_pin(&mut store, "123", "123", &PinPolicy::default()).is_err());
        assert!(!pin_status(&store).unwrap().is_set);
    }

    #[test]
    fn test_status_records_update_time() {
        let mut store = MemoryStore::new();
        assert_eq!(
            pin_status(&store).unwrap(),
            PinStatus {
                is_set: false,
                updated_at: None
            }
        );
        set_pin(&mut store, "4242", "4242", &PinPolicy::default()).unwrap();
        let status = pin_status(&store).unwrap();
        assert!(status.is_set);
        assert!(status.updated_at.is_some());
    }
}
