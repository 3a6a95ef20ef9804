//! `otpvault install`: create a new, empty vault.

use crate::cli::output;
use crate::cli::{manager, prompt_new_password, Cli};
use crate::errors::{OtpVaultError, Result};
use crate::vault::VaultState;

/// Execute the `install` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let manager = manager(cli)?;

    // 1. Refuse early so we don't prompt for a password for nothing.
    if manager.state() != VaultState::Uninitialized {
        output::tip("Use `otpvault clean-install --force` to start over.");
        return Err(OtpVaultError::AlreadyInstalled(manager.vault_path()));
    }

    // 2. Prompt for a new password (with confirmation).
    let password = prompt_new_password(&manager.policy())?;

    // 3. Create the vault file.
    manager.install(&password)?;
    output::success(&format!(
        "Vault created at {}",
        manager.vault_path().display()
    ));

    output::tip("Run `otpvault add --secret <BASE32> --issuer <NAME> --account <LABEL>` to add a token.");
    output::tip("Run `otpvault add --uri 'otpauth://...'` to add a token from a QR code.");

    Ok(())
}
