//! PIN fingerprinting and validation.
//!
//! The fingerprint is the base64 encoding of `SHA-256(pin)`. It is what the
//! store keeps under `pinKey`, and the same string is imported as AES key
//! material when sealing or opening entries.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{LockError, Result};

/// Default minimum PIN length in characters.
pub const DEFAULT_MIN_PIN_LENGTH: usize = 4;

/// Default maximum PIN length in characters.
pub const DEFAULT_MAX_PIN_LENGTH: usize = 8;

/// One-way digest of a PIN, doubling as symmetric key material.
///
/// The inner string is zeroized on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap a fingerprint previously read from the store.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The encoded fingerprint, as persisted under `pinKey`.
    ///
    /// Avoid logging this value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into raw key bytes.
    pub(crate) fn key_bytes(&self) -> Result<zeroize::Zeroizing<Vec<u8>>> {
        STANDARD
            .decode(self.0.as_bytes())
            .map(zeroize::Zeroizing::new)
            .map_err(|e| LockError::Crypto(format!("Invalid key material: {}", e)))
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Fingerprint").field(&"[REDACTED]").finish()
    }
}

/// Length rules applied when a PIN is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            min_length: DEFAULT_MIN_PIN_LENGTH,
            max_length: DEFAULT_MAX_PIN_LENGTH,
        }
    }
}

/// Hash a PIN into its fingerprint.
///
/// Deterministic: the same PIN always yields the same fingerprint.
///
/// # Examples
///
/// ```
/// use chatlock_core::crypto::hash_pin;
///
/// assert_eq!(hash_pin("4242"), hash_pin("4242"));
/// assert_ne!(hash_pin("4242"), hash_pin("0000"));
/// ```
pub fn hash_pin(pin: &str) -> Fingerprint {
    let digest = Sha256::digest(pin.as_bytes());
    Fingerprint(STANDARD.encode(digest))
}

/// Validate a new PIN and its confirmation against `policy`.
pub fn validate_pin(pin: &str, confirm: &str, policy: &PinPolicy) -> Result<()> {
    if pin.is_empty() || pin.chars().count() < policy.min_length {
        return Err(LockError::InvalidInput(format!(
            "PIN should be at least {} digits.",
            policy.min_length
        )));
    }

    if pin.chars().count() > policy.max_length {
        return Err(LockError::InvalidInput(format!(
            "PIN should be at most {} digits.",
            policy.max_length
        )));
    }

    if pin != confirm {
        return Err(LockError::InvalidInput("Pins do not match.".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_pin("4242"), hash_pin("4242"));
    }

    #[test]
    fn test_hash_matches_sha256_base64() {
        // SHA-256("4242"), base64 encoded
        let expected = STANDARD.encode(Sha256::digest(b"4242"));
        assert_eq!(hash_pin("4242").as_str(), expected);
        assert_eq!(hash_pin("4242").as_str().len(), 44);
    }

    #[test]
    fn test_different_pins_differ() {
        assert_ne!(hash_pin("4242"), hash_pin("4243"));
    }

    #[test]
    fn test_key_bytes_are_32_bytes() {
        let key = hash_pin("4242").key_bytes().unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn test_debug_redacts() {
        let fingerprint = hash_pin("4242");
        let debug_output = format!("{:?}", fingerprint);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains(fingerprint.as_str()));
    }

    #[test]
    fn test_validate_pin_too_short() {
        let result = validate_pin("123", "123", &PinPolicy::default());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("at least 4 digits"));
    }

    #[test]
    fn test_validate_pin_too_long() {
        let result = validate_pin("123456789", "123456789", &PinPolicy::default());
        assert!(result.unwrap_err().to_string().contains("at most 8"));
    }

    #[test]
    fn test_validate_pin_mismatch() {
        let result = validate_pin("4242", "4243", &PinPolicy::default());
        assert!(result.unwrap_err().to_string().contains("do not match"));
    }

    #[test]
    fn test_validate_pin_ok() {
        assert!(validate_pin("4242", "4242", &PinPolicy::default()).is_ok());
        assert!(validate_pin("12345678", "12345678", &PinPolicy::default()).is_ok());
    }
}
