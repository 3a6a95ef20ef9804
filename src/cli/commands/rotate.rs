//! `otpvault passwd`: change the vault master password.
//!
//! The vault is re-encrypted under a key derived from the new password
//! and a fresh salt, then replaced atomically.  Existing backups keep
//! the password they were written with.

use crate::cli::output;
use crate::cli::{manager, open_session, prompt_changed_password, Cli};
use crate::errors::Result;

/// Execute the `passwd` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let manager = manager(cli)?;

    // 1. Open the vault with the current password.
    output::info("Enter your current vault password.");
    let mut session = open_session(&manager)?;

    // 2. Prompt for the new password.
    output::info("Choose your new vault password.");
    let new_password = prompt_changed_password(&manager.policy())?;

    // 3. Re-key and save atomically.
    session.change_password(&new_password)?;

    output::success(&format!(
        "Password changed ({} token(s) re-encrypted)",
        session.store().len()
    ));
    output::tip("Backups made before this change still open with the old password.");

    Ok(())
}
