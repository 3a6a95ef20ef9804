//! `otpvault clean-install`: wipe the vault and all backups, then install.

use crate::cli::output;
use crate::cli::{manager, prompt_new_password, Cli};
use crate::errors::{OtpVaultError, Result};

/// Execute the `clean-install` command.
pub fn execute(cli: &Cli, force: bool) -> Result<()> {
    let manager = manager(cli)?;

    if !force {
        output::warning("This deletes every stored token and every backup.");
        output::tip("Re-run with --force to confirm.");
        return Err(OtpVaultError::ConfirmationRequired);
    }

    let password = prompt_new_password(&manager.policy())?;
    manager.clean_reinstall(&password, force)?;

    output::success(&format!(
        "Vault reset at {}",
        manager.vault_path().display()
    ));
    Ok(())
}
