//! Vault lifecycle and the unlocked session.
//!
//! ```text
//! Uninitialized --install--> Locked --unlock--> Unlocked (Session)
//!       ^                      ^                    |
//!       |                      +------lock/drop-----+
//!       +-----clean_reinstall (destroys, then installs again)
//! ```
//!
//! `VaultManager` is the only component that touches vault paths.  A
//! `Session` holds the decrypted records, the derived key and the
//! cross-process lock; every mutation goes through `Session::mutate`,
//! which persists the new snapshot atomically and restores the previous
//! in-memory state if the write fails.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::bridge::{self, EntryError, Format};
use crate::config::{PasswordPolicy, Settings};
use crate::crypto::{generate_salt, VaultKey};
use crate::errors::{OtpVaultError, Result};
use crate::otp::CodeGenerator;

use super::format::{self, BackupDocument, VaultDocument, FORMAT_VERSION};
use super::lock::VaultLock;
use super::record::{NewRecord, OtpKind, TokenRecord};
use super::store::{ListFilter, RecordStore};

/// Prefix of every backup file name.
pub const BACKUP_PREFIX: &str = "otpvault-backup-";
/// Extension of vault and backup files.
pub const BACKUP_EXTENSION: &str = "bin";

/// Durable state of a vault directory.  The unlocked state is a `Session`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultState {
    Uninitialized,
    Locked,
}

/// Non-fatal: a backup was written by a different document version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionMismatch {
    pub found: u32,
    pub expected: u32,
}

/// Outcome of `Session::restore`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub restored: usize,
    pub warning: Option<VersionMismatch>,
}

/// Outcome of `Session::import`.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Ids assigned to the imported records, in input order.
    pub imported: Vec<u64>,
    /// Entries that were skipped, with the reason.
    pub errors: Vec<EntryError>,
}

/// Health of one stored token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub id: u64,
    pub issuer: String,
    pub account: String,
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.error.is_none()
    }
}

// ---------------------------------------------------------------------------
// VaultManager
// ---------------------------------------------------------------------------

/// Entry point for a vault directory (e.g. `~/.otpvault`).
#[derive(Debug, Clone)]
pub struct VaultManager {
    vault_dir: PathBuf,
    settings: Settings,
}

impl VaultManager {
    pub fn new(vault_dir: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            vault_dir: vault_dir.into(),
            settings,
        }
    }

    /// Manager for `vault_dir`, with settings loaded from its `otpvault.toml`.
    pub fn open(vault_dir: impl Into<PathBuf>) -> Result<Self> {
        let vault_dir = vault_dir.into();
        let settings = Settings::load(&vault_dir)?;
        Ok(Self::new(vault_dir, settings))
    }

    pub fn vault_dir(&self) -> &Path {
        &self.vault_dir
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn vault_path(&self) -> PathBuf {
        self.settings.vault_path(&self.vault_dir)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.settings.backup_path(&self.vault_dir)
    }

    pub fn policy(&self) -> PasswordPolicy {
        self.settings.password_policy()
    }

    pub fn state(&self) -> VaultState {
        if self.vault_path().exists() {
            VaultState::Locked
        } else {
            VaultState::Uninitialized
        }
    }

    /// Create an empty vault protected by `password`.
    ///
    /// Fails with `AlreadyInstalled` if a vault exists and with
    /// `WeakPassword` if the password does not meet the policy.
    pub fn install(&self, password: &str) -> Result<()> {
        let vault_path = self.vault_path();
        if vault_path.exists() {
            return Err(OtpVaultError::AlreadyInstalled(vault_path));
        }
        self.policy().check(password)?;

        self.ensure_vault_dir()?;
        let _lock = VaultLock::acquire(&vault_path, self.settings.lock_timeout())?;

        // Another process may have installed while we waited for the lock.
        if vault_path.exists() {
            return Err(OtpVaultError::AlreadyInstalled(vault_path));
        }
        self.write_empty_vault(password)?;

        tracing::info!(path = %vault_path.display(), "vault installed");
        Ok(())
    }

    /// Decrypt the vault and start a session.
    ///
    /// A wrong or empty password and a tampered file all fail with
    /// `Authentication`.  The vault file is never written here.
    pub fn unlock(&self, password: &str) -> Result<Session> {
        let vault_path = self.vault_path();
        if !vault_path.exists() {
            return Err(OtpVaultError::NotInstalled(vault_path));
        }

        let lock = VaultLock::acquire(&vault_path, self.settings.lock_timeout())?;

        let data = fs::read(&vault_path)?;
        let (key, plaintext) = format::open(&data, password.as_bytes())?;
        let doc = format::decode_vault(&plaintext)?;

        if doc.format_version > FORMAT_VERSION {
            return Err(OtpVaultError::CorruptStore(format!(
                "vault format version {} is newer than supported version {FORMAT_VERSION}",
                doc.format_version
            )));
        }
        if doc.format_version < FORMAT_VERSION {
            tracing::warn!(
                found = doc.format_version,
                expected = FORMAT_VERSION,
                "vault uses an older format version, it will be upgraded on the next write"
            );
        }

        let store = RecordStore::from_parts(doc.records, doc.next_id);
        tracing::debug!(records = store.len(), "vault unlocked");

        Ok(Session {
            vault_path,
            backup_dir: self.backup_dir(),
            policy: self.policy(),
            key,
            store,
            _lock: lock,
        })
    }

    /// Destroy the vault and all backups, then install a fresh vault.
    ///
    /// `confirmed` is the caller's explicit confirmation; without it this
    /// fails with `ConfirmationRequired` and nothing is touched.  The new
    /// password is checked before anything is deleted.
    pub fn clean_reinstall(&self, password: &str, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Err(OtpVaultError::ConfirmationRequired);
        }
        self.settings.validate()?;
        self.policy().check(password)?;

        self.ensure_vault_dir()?;
        let vault_path = self.vault_path();
        let _lock = VaultLock::acquire(&vault_path, self.settings.lock_timeout())?;

        if vault_path.exists() {
            fs::remove_file(&vault_path)?;
        }
        let backup_dir = self.backup_dir();
        if backup_dir.exists() {
            fs::remove_dir_all(&backup_dir)?;
        }
        tracing::warn!(path = %vault_path.display(), "vault and backups deleted");

        self.write_empty_vault(password)?;
        tracing::info!(path = %vault_path.display(), "vault reinstalled");
        Ok(())
    }

    /// Backup files in the backup directory, newest first.
    pub fn list_backups(&self) -> Result<Vec<PathBuf>> {
        let backup_dir = self.backup_dir();
        if !backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups: Vec<PathBuf> = fs::read_dir(&backup_dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_backup_file(path))
            .collect();

        backups.sort_by(|a, b| backup_sort_key(b).cmp(&backup_sort_key(a)));
        Ok(backups)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn write_empty_vault(&self, password: &str) -> Result<()> {
        let key = VaultKey::derive(password.as_bytes(), generate_salt())?;
        let doc = VaultDocument {
            format_version: FORMAT_VERSION,
            next_id: RecordStore::new().next_id(),
            records: Vec::new(),
        };
        let sealed = format::seal(&key, &format::encode_vault(&doc)?)?;
        format::write_atomic(&self.vault_path(), &sealed)
    }

    fn ensure_vault_dir(&self) -> Result<()> {
        create_private_dir(&self.vault_dir)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// An unlocked vault.  Holds the lock until dropped or `lock`ed.
pub struct Session {
    vault_path: PathBuf,
    backup_dir: PathBuf,
    policy: PasswordPolicy,
    key: VaultKey,
    store: RecordStore,
    _lock: VaultLock,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("vault_path", &self.vault_path)
            .field("records", &self.store.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<&TokenRecord> {
        self.store.list(filter)
    }

    pub fn categories(&self) -> BTreeSet<String> {
        self.store.categories()
    }

    pub fn get(&self, id: u64) -> Result<&TokenRecord> {
        self.store.get(id)
    }

    /// Provisioning URI for a stored token.
    pub fn uri(&self, id: u64) -> Result<String> {
        Ok(bridge::uri::to_uri(self.store.get(id)?))
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    // ------------------------------------------------------------------
    // Mutations (each persists before returning)
    // ------------------------------------------------------------------

    /// Add a token and persist.
    pub fn add(&mut self, new: NewRecord) -> Result<TokenRecord> {
        self.mutate(|store| store.add(new).cloned())
    }

    /// Remove a token and persist.
    pub fn remove(&mut self, id: u64) -> Result<TokenRecord> {
        self.mutate(|store| store.remove(id))
    }

    /// Generate the current code for a token.
    ///
    /// HOTP: the counter is advanced and persisted before the code is
    /// returned; if persisting fails the counter is rolled back and no
    /// code is returned.  TOTP: nothing is consumed, so a failure to
    /// record `last_used_at` is only logged.
    pub fn generate<G>(&mut self, id: u64, generator: &G) -> Result<String>
    where
        G: CodeGenerator + ?Sized,
    {
        let kind = self.store.get(id)?.kind;
        match kind {
            OtpKind::Hotp => self.mutate(|store| {
                let counter = store.touch_counter(id)?;
                let record = store.get(id)?;
                generator.compute(&record.secret, record.kind, counter)
            }),
            OtpKind::Totp => {
                let record = self.store.get(id)?;
                let code = generator.compute(&record.secret, record.kind, 0)?;
                self.store.mark_used(id)?;
                if let Err(e) = self.persist() {
                    tracing::warn!(id, error = %e, "could not record TOTP usage");
                }
                Ok(code)
            }
        }
    }

    /// Import entries from `text`.  Best-effort: bad or duplicate
    /// entries are reported and skipped, the rest are persisted once.
    pub fn import(&mut self, text: &str, format: Format) -> Result<ImportReport> {
        let batch = bridge::import(text, format)?;

        self.mutate(|store| {
            let mut report = ImportReport {
                imported: Vec::new(),
                errors: batch.errors,
            };
            for (entry, new) in batch.records {
                match store.add(new) {
                    Ok(record) => report.imported.push(record.id),
                    Err(error) => report.errors.push(EntryError { entry, error }),
                }
            }
            report.errors.sort_by_key(|e| e.entry);
            Ok(report)
        })
    }

    /// Export every record in `format`.
    pub fn export(&self, format: Format) -> Result<String> {
        bridge::export(self.store.records(), format)
    }

    /// Write an encrypted point-in-time copy of the records to the
    /// backup directory and return its path.
    pub fn backup(&self) -> Result<PathBuf> {
        create_private_dir(&self.backup_dir)?;

        let now = Utc::now();
        let doc = BackupDocument {
            format_version: FORMAT_VERSION,
            created_at: now,
            records: self.store.records().to_vec(),
        };
        let sealed = format::seal(&self.key, &format::encode_backup(&doc)?)?;

        let stamp = now.format("%Y%m%d-%H%M%S-%3f").to_string();
        let mut path = self.backup_dir.join(backup_file_name(&stamp, 0));
        let mut attempt = 0;
        while path.exists() {
            attempt += 1;
            path = self.backup_dir.join(backup_file_name(&stamp, attempt));
        }

        format::write_atomic(&path, &sealed)?;
        tracing::info!(path = %path.display(), records = doc.records.len(), "backup written");
        Ok(path)
    }

    /// Replace the live records with the contents of a backup.
    ///
    /// `password` is the one the backup was written under.  A format
    /// version difference is reported in the returned report, not as an
    /// error.
    pub fn restore(&mut self, backup_path: &Path, password: &str) -> Result<RestoreReport> {
        let data = fs::read(backup_path)?;
        let (_, plaintext) = format::open(&data, password.as_bytes())?;
        let doc = format::decode_backup(&plaintext)?;

        let warning = (doc.format_version != FORMAT_VERSION).then(|| {
            tracing::warn!(
                found = doc.format_version,
                expected = FORMAT_VERSION,
                "backup format version differs, restoring anyway"
            );
            VersionMismatch {
                found: doc.format_version,
                expected: FORMAT_VERSION,
            }
        });

        let restored = doc.records.len();
        self.mutate(|store| {
            store.replace_all(doc.records);
            Ok(())
        })?;

        tracing::info!(path = %backup_path.display(), restored, "backup restored");
        Ok(RestoreReport { restored, warning })
    }

    /// Re-encrypt the vault under `new_password` with a fresh salt.
    pub fn change_password(&mut self, new_password: &str) -> Result<()> {
        self.policy.check(new_password)?;

        let unchanged = VaultKey::derive(new_password.as_bytes(), *self.key.salt())?;
        if unchanged.as_bytes() == self.key.as_bytes() {
            return Err(OtpVaultError::WeakPassword(
                "the new password must differ from the current one".into(),
            ));
        }

        let new_key = VaultKey::derive(new_password.as_bytes(), generate_salt())?;
        let old_key = std::mem::replace(&mut self.key, new_key);
        if let Err(e) = self.persist() {
            self.key = old_key;
            return Err(e);
        }

        tracing::info!("vault password changed");
        Ok(())
    }

    /// Check that every stored secret decodes and produces a code.
    /// Counters are not advanced.
    pub fn validate<G>(&self, generator: &G) -> Vec<ValidationResult>
    where
        G: CodeGenerator + ?Sized,
    {
        self.store
            .records()
            .iter()
            .map(|r| ValidationResult {
                id: r.id,
                issuer: r.issuer.clone(),
                account: r.account.clone(),
                error: generator
                    .compute(&r.secret, r.kind, r.counter)
                    .err()
                    .map(|e| e.to_string()),
            })
            .collect()
    }

    /// Re-encrypt the current records and atomically replace the vault.
    pub fn persist(&self) -> Result<()> {
        let doc = VaultDocument {
            format_version: FORMAT_VERSION,
            next_id: self.store.next_id(),
            records: self.store.records().to_vec(),
        };
        let sealed = format::seal(&self.key, &format::encode_vault(&doc)?)?;
        format::write_atomic(&self.vault_path, &sealed)?;
        tracing::debug!(records = doc.records.len(), "vault persisted");
        Ok(())
    }

    /// End the session and release the lock.
    pub fn lock(self) {
        tracing::debug!(path = %self.vault_path.display(), "vault locked");
    }

    /// Apply `f` to the store and persist.  If `f` or the write fails the
    /// in-memory store is returned to its previous state.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut RecordStore) -> Result<T>) -> Result<T> {
        let snapshot = self.store.clone();
        let outcome = f(&mut self.store).and_then(|value| self.persist().map(|()| value));
        if outcome.is_err() {
            self.store = snapshot;
        }
        outcome
    }
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

fn backup_file_name(stamp: &str, attempt: u32) -> String {
    if attempt == 0 {
        format!("{BACKUP_PREFIX}{stamp}.{BACKUP_EXTENSION}")
    } else {
        format!("{BACKUP_PREFIX}{stamp}_{attempt}.{BACKUP_EXTENSION}")
    }
}

/// `(stamp, attempt)` parsed from a backup file name, so `_10` orders
/// after `_9`.  Unparsable suffixes count as attempt 0.
fn backup_sort_key(path: &Path) -> (String, u32) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix(BACKUP_PREFIX))
        .unwrap_or_default();

    match stem.rsplit_once('_') {
        Some((stamp, attempt)) => match attempt.parse() {
            Ok(n) => (stamp.to_string(), n),
            Err(_) => (stem.to_string(), 0),
        },
        None => (stem.to_string(), 0),
    }
}

fn is_backup_file(path: &Path) -> bool {
    path.is_file()
        && path.extension().is_some_and(|e| e == BACKUP_EXTENSION)
        && path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(BACKUP_PREFIX))
}

/// Create `dir` (and parents) readable only by the owner.
fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(dir)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}
