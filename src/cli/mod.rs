//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use zeroize::Zeroizing;

use crate::config::{self, PasswordPolicy};
use crate::errors::{OtpVaultError, Result};
use crate::vault::{Session, VaultManager};

/// Environment variable holding the vault password (scripts/CI).
pub const PASSWORD_ENV: &str = "OTPVAULT_PASSWORD";
/// Environment variable holding the new password for `install` / `passwd`.
pub const NEW_PASSWORD_ENV: &str = "OTPVAULT_NEW_PASSWORD";
/// Environment variable holding the password of a backup being restored.
pub const BACKUP_PASSWORD_ENV: &str = "OTPVAULT_BACKUP_PASSWORD";

/// OtpVault CLI: encrypted local store for TOTP/HOTP tokens.
#[derive(Parser)]
#[command(
    name = "otpvault",
    about = "Encrypted local vault for TOTP/HOTP two-factor tokens",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Vault directory (default: ~/.otpvault)
    #[arg(long, env = "OTPVAULT_DIR", global = true)]
    pub vault_dir: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create a new, empty vault
    Install,

    /// Delete the vault and all backups, then create a new vault
    CleanInstall {
        /// Confirm the destructive reset
        #[arg(long)]
        force: bool,
    },

    /// Add a token from its fields or from an otpauth:// URI
    Add {
        /// Base32 shared secret
        #[arg(long, required_unless_present = "uri", conflicts_with = "uri")]
        secret: Option<String>,

        /// Service name (e.g. GitHub)
        #[arg(long, default_value = "")]
        issuer: String,

        /// Account label (e.g. alice@example.com)
        #[arg(long, required_unless_present = "uri", conflicts_with = "uri")]
        account: Option<String>,

        /// Token type: totp or hotp
        #[arg(long = "type", default_value = "totp")]
        kind: String,

        /// Initial HOTP counter
        #[arg(long, default_value = "0")]
        counter: u64,

        /// otpauth:// provisioning URI (e.g. decoded from a QR code)
        #[arg(long)]
        uri: Option<String>,

        /// Category (e.g. Work)
        #[arg(long)]
        category: Option<String>,

        /// Tag, may be repeated
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List tokens
    List {
        /// Case-insensitive search over issuer, account, category and tags
        #[arg(short, long)]
        search: Option<String>,

        /// Only tokens in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Generate a one-time code
    Generate {
        /// Token id (see `list`)
        id: u64,

        /// Do not copy the code to the clipboard
        #[arg(long)]
        no_clip: bool,
    },

    /// Remove a token
    #[command(alias = "delete")]
    Remove {
        /// Token id
        id: u64,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export tokens to a file or stdout
    Export {
        /// Output format: json (default), csv or uri
        #[arg(short, long, default_value = "json")]
        format: String,

        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import tokens from a file
    Import {
        /// Path to the file to import
        file: PathBuf,

        /// Import format: json, csv or uri (auto-detected from extension)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Write an encrypted backup of all tokens
    Backup,

    /// List backups, newest first
    Backups,

    /// Replace all tokens with the contents of a backup
    Restore {
        /// Backup file
        file: PathBuf,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// List categories in use
    Categories,

    /// Show a token as a QR code
    Qr {
        /// Token id
        id: u64,
        /// Write a PNG here instead of drawing in the terminal
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Change the vault's master password
    #[command(alias = "rotate-password")]
    Passwd,

    /// Check that every stored secret can produce a code
    Validate,

    /// Show version
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Resolve the vault directory: `--vault-dir` / `OTPVAULT_DIR`, else `~/.otpvault`.
pub fn vault_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.vault_dir {
        Some(dir) => Ok(dir.clone()),
        None => config::default_vault_dir(),
    }
}

/// Build a `VaultManager` for the resolved vault directory.
pub fn manager(cli: &Cli) -> Result<VaultManager> {
    VaultManager::open(vault_dir(cli)?)
}

/// Prompt for the password and unlock the vault.
pub fn open_session(manager: &VaultManager) -> Result<Session> {
    let password = prompt_password()?;
    manager.unlock(&password)
}

/// Get the vault password, trying in order:
/// 1. `OTPVAULT_PASSWORD` env var (scripts/CI)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the password is wiped from memory on drop.
pub fn prompt_password() -> Result<Zeroizing<String>> {
    prompt_secret(PASSWORD_ENV, "Enter vault password")
}

/// Password of a backup: `OTPVAULT_BACKUP_PASSWORD`, else `fallback`
/// (the live vault password).
pub fn backup_password(fallback: &Zeroizing<String>) -> Zeroizing<String> {
    match std::env::var(BACKUP_PASSWORD_ENV) {
        Ok(pw) if !pw.is_empty() => Zeroizing::new(pw),
        _ => fallback.clone(),
    }
}

/// Prompt for the password of a vault being created (`install`,
/// `clean-install`).
///
/// Respects `OTPVAULT_NEW_PASSWORD`, then `OTPVAULT_PASSWORD`, for
/// scripted usage; those are checked against the policy by the vault
/// itself.  Interactive entries are re-prompted until they pass.
pub fn prompt_new_password(policy: &PasswordPolicy) -> Result<Zeroizing<String>> {
    prompt_password_choice(policy, &[NEW_PASSWORD_ENV, PASSWORD_ENV])
}

/// Prompt for the replacement password in `passwd`.
///
/// Only `OTPVAULT_NEW_PASSWORD` is honoured: `OTPVAULT_PASSWORD` holds
/// the current password there.
pub fn prompt_changed_password(policy: &PasswordPolicy) -> Result<Zeroizing<String>> {
    prompt_password_choice(policy, &[NEW_PASSWORD_ENV])
}

fn prompt_password_choice(
    policy: &PasswordPolicy,
    env_vars: &[&str],
) -> Result<Zeroizing<String>> {
    for &var in env_vars {
        if let Ok(pw) = std::env::var(var) {
            if !pw.is_empty() {
                return Ok(Zeroizing::new(pw));
            }
        }
    }

    loop {
        let password = Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Choose vault password")
                .with_confirmation(
                    "Confirm vault password",
                    "Passwords do not match, try again",
                )
                .interact()
                .map_err(|e| OtpVaultError::CommandFailed(format!("password prompt: {e}")))?,
        );

        let strength = policy.assess(&password);
        if !strength.is_strong {
            for issue in &strength.issues {
                output::warning(&format!("Password {issue}."));
            }
            continue;
        }

        return Ok(password);
    }
}

/// Ask a yes/no question, defaulting to "no".
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| OtpVaultError::CommandFailed(format!("confirm prompt: {e}")))
}

fn prompt_secret(env_var: &str, prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(pw) = std::env::var(env_var) {
        if !pw.is_empty() {
            return Ok(Zeroizing::new(pw));
        }
    }

    let pw = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| OtpVaultError::CommandFailed(format!("password prompt: {e}")))?;
    Ok(Zeroizing::new(pw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn add_accepts_uri_without_fields() {
        let cli = Cli::try_parse_from([
            "otpvault",
            "add",
            "--uri",
            "otpauth://totp/A:a?secret=JBSWY3DPEHPK3PXP",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Add { uri: Some(_), .. }));
    }

    #[test]
    fn add_requires_secret_or_uri() {
        assert!(Cli::try_parse_from(["otpvault", "add", "--account", "a"]).is_err());
    }

    #[test]
    fn remove_has_delete_alias() {
        let cli = Cli::try_parse_from(["otpvault", "delete", "3", "--force"]).unwrap();
        assert!(matches!(cli.command, Commands::Remove { id: 3, force: true }));
    }

    #[test]
    fn vault_dir_flag_overrides_default() {
        let cli = Cli::try_parse_from(["otpvault", "--vault-dir", "/tmp/v", "list"]).unwrap();
        assert_eq!(vault_dir(&cli).unwrap(), PathBuf::from("/tmp/v"));
    }
}
