//! Configuration: `otpvault.toml` settings, password policy and the
//! default vault location.

pub mod policy;
pub mod settings;

use std::path::PathBuf;

use directories::UserDirs;

use crate::errors::{OtpVaultError, Result};

pub use policy::{PasswordPolicy, PasswordStrength};
pub use settings::Settings;

/// Name of the vault directory under the user's home.
pub const DEFAULT_DIR_NAME: &str = ".otpvault";

/// `~/.otpvault`.
pub fn default_vault_dir() -> Result<PathBuf> {
    let home = UserDirs::new()
        .map(|u| u.home_dir().to_path_buf())
        .ok_or_else(|| OtpVaultError::ConfigError("could not find home directory".into()))?;
    Ok(home.join(DEFAULT_DIR_NAME))
}
