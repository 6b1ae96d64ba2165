//! AES-256-GCM sealing of entry payloads.
//!
//! Ciphertext and nonce are carried as separate base64 strings, matching the
//! `ciphertext`/`iv` pair stored on every vault entry.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::pin::Fingerprint;
use crate::error::{LockError, Result};

/// Nonce length in bytes (96 bits).
pub const NONCE_LENGTH: usize = 12;

/// Authenticated ciphertext and the nonce it was sealed with.
///
/// The two fields only ever exist together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sealed {
    pub ciphertext: String,
    pub iv: String,
}

fn cipher_for(key: &Fingerprint) -> Result<Aes256Gcm> {
    let bytes = key.key_bytes()?;
    Aes256Gcm::new_from_slice(&bytes)
        .map_err(|_| LockError::Crypto(format!("Invalid key length: {} bytes", bytes.len())))
}

/// Encrypt `plaintext` under `key` with a freshly drawn nonce.
///
/// # Examples
///
/// ```
/// use chatlock_core::crypto::{decrypt, encrypt, hash_pin};
///
/// let key = hash_pin("4242");
/// let sealed = encrypt(&key, "secret").unwrap();
/// assert_eq!(decrypt(&key, &sealed.ciphertext, &sealed.iv).unwrap(), "secret");
/// ```
pub fn encrypt(key: &Fingerprint, plaintext: &str) -> Result<Sealed> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| LockError::Crypto(format!("Encryption failed: {}", e)))?;

    Ok(Sealed {
        ciphertext: STANDARD.encode(ciphertext),
        iv: STANDARD.encode(nonce_bytes),
    })
}

/// Decrypt a base64 ciphertext/nonce pair under `key`.
///
/// # Errors
///
/// Returns `LockError::Crypto` if the key is wrong, the data is corrupted,
/// or the tag does not verify. No partial plaintext is ever returned.
pub fn decrypt(key: &Fingerprint, ciphertext: &str, iv: &str) -> Result<String> {
    let cipher = cipher_for(key)?;

    let nonce_bytes = STANDARD
        .decode(iv.as_bytes())
        .map_err(|e| LockError::Crypto(format!("Invalid nonce encoding: {}", e)))?;
    if nonce_bytes.len() != NONCE_LENGTH {
        return Err(LockError::Crypto(format!(
            "Invalid nonce length: {} bytes",
            nonce_bytes.len()
        )));
    }
    let payload = STANDARD
        .decode(ciphertext.as_bytes())
        .map_err(|e| LockError::Crypto(format!("Invalid ciphertext encoding: {}", e)))?;

    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), payload.as_slice())
        .map_err(|_| LockError::Crypto("Decryption failed".to_string()))?;

    String::from_utf8(plaintext)
        .map_err(|_| LockError::Crypto("Decrypted payload is not valid UTF-8".to_string()))
}
