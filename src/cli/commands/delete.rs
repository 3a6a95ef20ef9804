//! `otpvault remove`: delete a token from the vault.

use crate::cli::output;
use crate::cli::{confirm, manager, open_session, Cli};
use crate::errors::Result;

/// Execute the `remove` command.
pub fn execute(cli: &Cli, id: u64, force: bool) -> Result<()> {
    let manager = manager(cli)?;
    let mut session = open_session(&manager)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force {
        let record = session.get(id)?;
        let prompt = format!(
            "Delete token {id} ({} / {})?",
            record.issuer, record.account
        );
        if !confirm(&prompt)? {
            output::info("Cancelled.");
            return Ok(());
        }
    }

    let removed = session.remove(id)?;
    output::success(&format!(
        "Removed token {} ({} / {})",
        removed.id, removed.issuer, removed.account
    ));

    Ok(())
}
