//! Encrypted vault envelope and the documents stored inside it.
//!
//! Vault and backup files share one layout:
//!
//! ```text
//! [salt: 16 bytes][nonce: 12 bytes][AES-256-GCM ciphertext + 16-byte tag]
//! ```
//!
//! - **Salt**: PBKDF2 salt, stored in clear so the key can be re-derived.
//! - **Nonce + ciphertext**: output of `crypto::encrypt` over a JSON
//!   document (`VaultDocument` for the live vault, `BackupDocument` for
//!   backups).
//!
//! Files are replaced atomically: the new bytes are staged in a hidden
//! temp file next to the target, synced, then renamed over it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::TokenRecord;
use crate::crypto::{decrypt, encrypt, VaultKey, CIPHERTEXT_OVERHEAD, SALT_LEN};
use crate::errors::{OtpVaultError, Result};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Current version of the plaintext documents.
pub const FORMAT_VERSION: u32 = 1;

/// Smallest byte length a well-formed envelope can have (empty plaintext).
pub const MIN_ENVELOPE_LEN: usize = SALT_LEN + CIPHERTEXT_OVERHEAD;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Plaintext of the live vault file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultDocument {
    pub format_version: u32,

    /// Id high-water mark (see `RecordStore::next_id`).
    #[serde(default)]
    pub next_id: u64,

    pub records: Vec<TokenRecord>,
}

/// Plaintext of a backup file: a point-in-time copy of the records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupDocument {
    pub format_version: u32,
    pub created_at: DateTime<Utc>,
    pub records: Vec<TokenRecord>,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Encrypt `plaintext` and prefix the key's salt.
pub fn seal(key: &VaultKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let ciphertext = encrypt(key.as_bytes(), plaintext)?;
    let mut out = Vec::with_capacity(SALT_LEN + ciphertext.len());
    out.extend_from_slice(key.salt());
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Split an envelope into its salt and the encrypted remainder.
///
/// Files too short to hold a salt, nonce and tag are `CorruptStore` and
/// never reach the cipher.
pub fn split_envelope(data: &[u8]) -> Result<([u8; SALT_LEN], &[u8])> {
    if data.len() < MIN_ENVELOPE_LEN {
        return Err(OtpVaultError::CorruptStore(format!(
            "file is {} bytes, a vault needs at least {MIN_ENVELOPE_LEN}",
            data.len()
        )));
    }

    let (salt_bytes, ciphertext) = data.split_at(SALT_LEN);
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(salt_bytes);
    Ok((salt, ciphertext))
}

/// Derive the key from `password` and the envelope's salt, then decrypt.
///
/// Returns the key so the caller can re-seal later without re-deriving.
pub fn open(data: &[u8], password: &[u8]) -> Result<(VaultKey, Vec<u8>)> {
    let (salt, ciphertext) = split_envelope(data)?;
    if password.is_empty() {
        return Err(OtpVaultError::Authentication);
    }
    let key = VaultKey::derive(password, salt)?;
    let plaintext = decrypt(key.as_bytes(), ciphertext)?;
    Ok((key, plaintext))
}

// ---------------------------------------------------------------------------
// Document (de)serialization
// ---------------------------------------------------------------------------

pub fn encode_vault(doc: &VaultDocument) -> Result<Vec<u8>> {
    serde_json::to_vec(doc).map_err(|e| OtpVaultError::SerializationError(format!("vault: {e}")))
}

/// Parse decrypted vault plaintext.  Authenticated bytes that are not a
/// vault document mean the file is corrupt, not that the password is wrong.
pub fn decode_vault(plaintext: &[u8]) -> Result<VaultDocument> {
    serde_json::from_slice(plaintext)
        .map_err(|e| OtpVaultError::CorruptStore(format!("vault document: {e}")))
}

pub fn encode_backup(doc: &BackupDocument) -> Result<Vec<u8>> {
    serde_json::to_vec(doc).map_err(|e| OtpVaultError::SerializationError(format!("backup: {e}")))
}

pub fn decode_backup(plaintext: &[u8]) -> Result<BackupDocument> {
    serde_json::from_slice(plaintext)
        .map_err(|e| OtpVaultError::CorruptStore(format!("backup document: {e}")))
}

// ---------------------------------------------------------------------------
// Atomic file replacement
// ---------------------------------------------------------------------------

/// Write `data` to `path` **atomically**.
///
/// 1. Stage the bytes in a hidden temp file in the same directory.
/// 2. Rename the temp file over the target path.
///
/// The rename ensures readers never see a half-written file: they get
/// either the old complete file or the new one.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let staged = stage(path, data)?;
    if let Err(e) = commit(&staged, path) {
        let _ = fs::remove_file(&staged);
        return Err(e);
    }
    Ok(())
}

/// Write `data` to the temp file for `path` and flush it to disk.
///
/// The target itself is not touched until `commit`.
pub fn stage(path: &Path, data: &[u8]) -> Result<PathBuf> {
    let tmp_path = staging_path(path);

    let mut file = create_private(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    Ok(tmp_path)
}

/// Rename a staged file over `path`.
pub fn commit(staged: &Path, path: &Path) -> Result<()> {
    fs::rename(staged, path)?;

    // Persist the rename itself (directory entry) on Unix.
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

/// Hidden sibling used while staging: `<dir>/.<name>.tmp`.
pub fn staging_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    parent.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ))
}

/// Create (or truncate) a file readable only by the owner.
fn create_private(path: &Path) -> Result<fs::File> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        let file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        Ok(file)
    }

    #[cfg(not(unix))]
    {
        Ok(fs::File::create(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::generate_salt;
    use tempfile::TempDir;

    fn key() -> VaultKey {
        VaultKey::derive(b"Str0ng!Pass", generate_salt()).unwrap()
    }

    #[test]
    fn seal_then_open_roundtrip() {
        let key = key();
        let sealed = seal(&key, b"{\"hello\":1}").unwrap();
        assert_eq!(&sealed[..SALT_LEN], key.salt());

        let (_, plaintext) = open(&sealed, b"Str0ng!Pass").unwrap();
        assert_eq!(plaintext, b"{\"hello\":1}");
    }

    #[test]
    fn short_file_is_corrupt_not_authentication() {
        let err = open(&[0u8; MIN_ENVELOPE_LEN - 1], b"pw").unwrap_err();
        assert!(matches!(err, OtpVaultError::CorruptStore(_)));
    }

    #[test]
    fn wrong_password_is_authentication_error() {
        let sealed = seal(&key(), b"data").unwrap();
        let err = open(&sealed, b"wrong-password").unwrap_err();
        assert!(matches!(err, OtpVaultError::Authentication));
    }

    #[test]
    fn empty_password_is_authentication_error() {
        let sealed = seal(&key(), b"data").unwrap();
        assert!(matches!(
            open(&sealed, b""),
            Err(OtpVaultError::Authentication)
        ));
    }

    #[test]
    fn garbage_plaintext_is_corrupt_store() {
        assert!(matches!(
            decode_vault(b"not json"),
            Err(OtpVaultError::CorruptStore(_))
        ));
    }

    #[test]
    fn write_atomic_replaces_file_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.bin");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn staged_but_uncommitted_write_leaves_target_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vault.bin");
        write_atomic(&path, b"original").unwrap();

        let staged = stage(&path, b"replacement").unwrap();
        assert!(staged.exists());
        assert_eq!(fs::read(&path).unwrap(), b"original");
    }

    #[test]
    fn staging_path_is_hidden_sibling() {
        let path = Path::new("/tmp/otp/vault.bin");
        assert_eq!(staging_path(path), PathBuf::from("/tmp/otp/.vault.bin.tmp"));
    }
}
