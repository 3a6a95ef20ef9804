//! `otpvault validate`: check every stored token can produce a code.

use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::errors::{OtpVaultError, Result};
use crate::otp::StandardGenerator;

/// Execute the `validate` command.  Fails if any token is broken.
pub fn execute(cli: &Cli) -> Result<()> {
    let manager = manager(cli)?;
    let session = open_session(&manager)?;

    let results = session.validate(&StandardGenerator::new());
    if results.is_empty() {
        output::info("No tokens to validate.");
        return Ok(());
    }

    output::print_validation(&results);

    let broken = results.iter().filter(|r| !r.is_valid()).count();
    if broken > 0 {
        return Err(OtpVaultError::CommandFailed(format!(
            "{broken} of {} token(s) are invalid",
            results.len()
        )));
    }

    output::success(&format!("All {} token(s) are valid", results.len()));
    Ok(())
}
