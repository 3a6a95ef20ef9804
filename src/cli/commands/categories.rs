//! `otpvault categories`: list categories in use.

use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::errors::Result;

/// Execute the `categories` command.
pub fn execute(cli: &Cli) -> Result<()> {
    let manager = manager(cli)?;
    let session = open_session(&manager)?;

    let categories = session.categories();
    if categories.is_empty() {
        output::info("No categories yet.");
        output::tip("Use `otpvault add ... --category <NAME>` to file tokens.");
        return Ok(());
    }

    for category in categories {
        println!("{category}");
    }
    Ok(())
}
