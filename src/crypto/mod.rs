//! Cryptographic primitives for OtpVault.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - PBKDF2-HMAC-SHA256 password-based key derivation (`kdf`)
//! - A zeroize-on-drop holder for the derived vault key (`keys`)

pub mod encryption;
pub mod kdf;
pub mod keys;

// Re-export the most commonly used items so callers can write:
//   use crate::crypto::{encrypt, decrypt, derive_key, ...};
pub use encryption::{decrypt, encrypt, CIPHERTEXT_OVERHEAD};
pub use kdf::{derive_key, generate_salt, KEY_LEN, PBKDF2_ITERATIONS, SALT_LEN};
pub use keys::VaultKey;
