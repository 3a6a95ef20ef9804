//! `otpvault version`: display version and build details.

use console::style;

use crate::crypto::PBKDF2_ITERATIONS;
use crate::errors::Result;
use crate::vault::format::FORMAT_VERSION;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    let current = env!("CARGO_PKG_VERSION");
    println!("otpvault {current}");
    println!(
        "{} vault format v{FORMAT_VERSION}, PBKDF2-SHA256 x{PBKDF2_ITERATIONS}, AES-256-GCM",
        style("\u{2192}").dim()
    );
    Ok(())
}
