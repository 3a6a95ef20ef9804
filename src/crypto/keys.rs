//! Holder for the derived vault key.

use zeroize::Zeroize;

use super::kdf::{derive_key, KEY_LEN, SALT_LEN};
use crate::errors::Result;

/// A 32-byte vault key together with the salt it was derived from.
///
/// The key bytes are zeroed when the value is dropped, so an unlocked
/// session never leaves key material behind after it ends.
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
    salt: [u8; SALT_LEN],
}

impl VaultKey {
    /// Derive a key from `password` and `salt` (PBKDF2).
    pub fn derive(password: &[u8], salt: [u8; SALT_LEN]) -> Result<Self> {
        let mut bytes = derive_key(password, &salt)?;
        let key = Self { bytes, salt };
        bytes.zeroize();
        Ok(key)
    }

    /// Access the raw key bytes (e.g. to pass to the cipher).
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// The salt stored alongside ciphertext produced with this key.
    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey").finish_non_exhaustive()
    }
}
