use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{OtpVaultError, Result};

use super::policy::PasswordPolicy;

/// Vault-level configuration, loaded from `<vault_dir>/otpvault.toml`.
///
/// Every field has a sensible default so OtpVault works out-of-the-box
/// without any config file at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Minimum master password length accepted by install / password change.
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,

    /// How many of lowercase/uppercase/digit/symbol a password must contain.
    #[serde(default = "default_min_character_classes")]
    pub min_character_classes: usize,

    /// How long to wait for another process to release the vault lock.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Directory (relative to the vault dir) where backups are written.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,

    /// Vault file name inside the vault dir.
    #[serde(default = "default_vault_file")]
    pub vault_file: String,

    /// Copy generated codes to the clipboard unless `--no-clip` is given.
    #[serde(default = "default_copy_to_clipboard")]
    pub copy_to_clipboard: bool,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_min_password_length() -> usize {
    8
}

fn default_min_character_classes() -> usize {
    3
}

fn default_lock_timeout_ms() -> u64 {
    3_000
}

fn default_backup_dir() -> String {
    "backups".to_string()
}

fn default_vault_file() -> String {
    "vault.bin".to_string()
}

fn default_copy_to_clipboard() -> bool {
    true
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            min_character_classes: default_min_character_classes(),
            lock_timeout_ms: default_lock_timeout_ms(),
            backup_dir: default_backup_dir(),
            vault_file: default_vault_file(),
            copy_to_clipboard: default_copy_to_clipboard(),
        }
    }
}

impl Settings {
    /// Name of the config file we look for in the vault directory.
    pub const FILE_NAME: &'static str = "otpvault.toml";

    /// Load settings from `<vault_dir>/otpvault.toml`.
    ///
    /// If the file does not exist, sensible defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(vault_dir: &Path) -> Result<Self> {
        let config_path = vault_dir.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            OtpVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        settings.validate().map_err(|e| match e {
            OtpVaultError::ConfigError(msg) => {
                OtpVaultError::ConfigError(format!("{}: {msg}", config_path.display()))
            }
            other => other,
        })?;

        Ok(settings)
    }

    /// Reject layouts that would put the vault file or the backup
    /// directory outside a dedicated spot inside the vault dir.
    ///
    /// `clean-install` deletes the backup directory recursively, so it
    /// must never resolve to the vault dir itself or one of its parents.
    pub fn validate(&self) -> Result<()> {
        if self.vault_file.trim().is_empty() {
            return Err(OtpVaultError::ConfigError(
                "vault_file must not be empty".into(),
            ));
        }
        if !is_strict_subpath(&self.backup_dir) {
            return Err(OtpVaultError::ConfigError(format!(
                "backup_dir '{}' must be a sub-directory of the vault directory",
                self.backup_dir
            )));
        }
        Ok(())
    }

    /// Full path to the vault file, e.g. `~/.otpvault/vault.bin`.
    pub fn vault_path(&self, vault_dir: &Path) -> PathBuf {
        vault_dir.join(&self.vault_file)
    }

    /// Full path to the backup directory, e.g. `~/.otpvault/backups`.
    pub fn backup_path(&self, vault_dir: &Path) -> PathBuf {
        vault_dir.join(&self.backup_dir)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// The password policy described by these settings.
    pub fn password_policy(&self) -> PasswordPolicy {
        PasswordPolicy {
            min_length: self.min_password_length,
            min_character_classes: self.min_character_classes,
        }
    }
}

/// A relative path naming at least one directory below its base, with
/// no `..`, root or prefix components.
fn is_strict_subpath(path: &str) -> bool {
    let path = Path::new(path.trim());
    let mut depth = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    depth > 0
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.min_password_length, 8);
        assert_eq!(s.min_character_classes, 3);
        assert_eq!(s.lock_timeout_ms, 3_000);
        assert_eq!(s.backup_dir, "backups");
        assert_eq!(s.vault_file, "vault.bin");
        assert!(s.copy_to_clipboard);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
min_password_length = 12
min_character_classes = 4
lock_timeout_ms = 500
backup_dir = "snapshots"
vault_file = "tokens.bin"
copy_to_clipboard = false
"#;
        fs::write(tmp.path().join("otpvault.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.min_password_length, 12);
        assert_eq!(settings.min_character_classes, 4);
        assert_eq!(settings.lock_timeout(), Duration::from_millis(500));
        assert_eq!(settings.backup_dir, "snapshots");
        assert_eq!(settings.vault_file, "tokens.bin");
        assert!(!settings.copy_to_clipboard);
    }

    #[test]
    fn load_uses_defaults_for_missing_fields() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("otpvault.toml"), "lock_timeout_ms = 10\n").unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.lock_timeout_ms, 10);
        assert_eq!(settings.vault_file, "vault.bin");
        assert_eq!(settings.min_password_length, 8);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("otpvault.toml"), "not valid {{toml").unwrap();

        assert!(matches!(
            Settings::load(tmp.path()),
            Err(OtpVaultError::ConfigError(_))
        ));
    }

    #[test]
    fn load_rejects_backup_dir_outside_vault_dir() {
        for bad in ["", ".", "./", "..", "../elsewhere", "/tmp/backups", "a/../.."] {
            let tmp = TempDir::new().unwrap();
            fs::write(
                tmp.path().join("otpvault.toml"),
                format!("backup_dir = {bad:?}\n"),
            )
            .unwrap();

            assert!(
                matches!(Settings::load(tmp.path()), Err(OtpVaultError::ConfigError(_))),
                "backup_dir {bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn nested_backup_dir_is_accepted() {
        let s = Settings {
            backup_dir: "./archive/backups".into(),
            ..Settings::default()
        };
        assert!(s.validate().is_ok());
    }

    #[test]
    fn paths_are_relative_to_vault_dir() {
        let s = Settings::default();
        let dir = Path::new("/home/user/.otpvault");
        assert_eq!(
            s.vault_path(dir),
            PathBuf::from("/home/user/.otpvault/vault.bin")
        );
        assert_eq!(
            s.backup_path(dir),
            PathBuf::from("/home/user/.otpvault/backups")
        );
    }
}
