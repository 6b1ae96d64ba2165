//! Cryptographic operations for Chatlock.
//!
//! This module provides the two primitives the lock flow relies on:
//! - **PIN fingerprint**: SHA-256 digest of the PIN, base64 encoded
//! - **AES-256-GCM**: authenticated encryption with a fresh 96-bit nonce
//!
//! ## Security Model
//!
//! The fingerprint is stored as the PIN verifier and is also imported as the
//! raw AES key. There is no salt and no key stretching, which keeps entries
//! readable by earlier installs but makes an offline guess of a short PIN
//! cheap.
//!
//! ## Threat Model
//!
//! We defend against:
//! - Casual viewing of a locked conversation on a shared device
//! - Tampering with stored ciphertext (the GCM tag rejects it)
//!
//! We do NOT defend against:
//! - Brute force of the PIN by someone holding the store
//! - Content copied out of the page before it was locked

pub mod cipher;
pub mod pin;

pub use cipher::{decrypt, encrypt, Sealed, NONCE_LENGTH};
pub use pin::{hash_pin, validate_pin, Fingerprint, PinPolicy};
