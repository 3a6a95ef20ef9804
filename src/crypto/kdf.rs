//! Password-based key derivation using PBKDF2-HMAC-SHA256.
//!
//! The iteration count is deliberately slow and is fixed for the lifetime
//! of the on-disk format: the vault envelope stores only the salt, so the
//! same count must be used on every open.

use rand::RngCore;
use sha2::Sha256;

use crate::errors::{OtpVaultError, Result};

/// Length of the salt in bytes.
pub const SALT_LEN: usize = 16;

/// Length of the derived key in bytes (256 bits, for AES-256).
pub const KEY_LEN: usize = 32;

/// PBKDF2 iteration count.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Derive a 32-byte vault key from a password and salt.
///
/// The same password + salt always produce the same key. Empty passwords
/// and salts shorter than `SALT_LEN` are rejected.
pub fn derive_key(password: &[u8], salt: &[u8]) -> Result<[u8; KEY_LEN]> {
    if password.is_empty() {
        return Err(OtpVaultError::KeyDerivationFailed(
            "password must not be empty".into(),
        ));
    }
    if salt.len() < SALT_LEN {
        return Err(OtpVaultError::KeyDerivationFailed(format!(
            "salt must be at least {SALT_LEN} bytes (got {})",
            salt.len()
        )));
    }

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, PBKDF2_ITERATIONS, &mut key);
    Ok(key)
}

/// Generate a cryptographically random 16-byte salt.
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}
