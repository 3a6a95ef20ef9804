//! `otpvault backup`, `backups` and `restore`.

use std::path::Path;

use crate::cli::output;
use crate::cli::{backup_password, confirm, manager, prompt_password, Cli};
use crate::errors::Result;

/// Execute the `backup` command.
pub fn execute_backup(cli: &Cli) -> Result<()> {
    let manager = manager(cli)?;
    let password = prompt_password()?;
    let session = manager.unlock(&password)?;

    let path = session.backup()?;
    output::success(&format!(
        "Backed up {} token(s) to {}",
        session.store().len(),
        path.display()
    ));
    Ok(())
}

/// Execute the `backups` command.
pub fn execute_list(cli: &Cli) -> Result<()> {
    let manager = manager(cli)?;
    let backups = manager.list_backups()?;

    if backups.is_empty() {
        output::info("No backups yet.");
        output::tip("Run `otpvault backup` to create one.");
        return Ok(());
    }

    for path in backups {
        println!("{}", path.display());
    }
    Ok(())
}

/// Execute the `restore` command.
pub fn execute_restore(cli: &Cli, file: &Path, force: bool) -> Result<()> {
    let manager = manager(cli)?;
    let password = prompt_password()?;
    let mut session = manager.unlock(&password)?;

    if !force {
        let prompt = format!(
            "Replace all {} token(s) with the contents of {}?",
            session.store().len(),
            file.display()
        );
        if !confirm(&prompt)? {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let backup_pw = backup_password(&password);
    let report = session.restore(file, &backup_pw)?;

    if let Some(mismatch) = report.warning {
        output::warning(&format!(
            "Backup format version {} differs from {}; restored anyway.",
            mismatch.found, mismatch.expected
        ));
    }
    output::success(&format!(
        "Restored {} token(s) from {}",
        report.restored,
        file.display()
    ));
    Ok(())
}
