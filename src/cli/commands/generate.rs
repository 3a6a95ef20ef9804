//! `otpvault generate`: print (and copy) the current code for a token.
//!
//! HOTP counters are advanced and saved before the code is printed.

use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::clipboard::{self, ClipboardProvider};
use crate::errors::Result;
use crate::otp::{self, StandardGenerator};
use crate::vault::OtpKind;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, id: u64, no_clip: bool) -> Result<()> {
    let manager = manager(cli)?;
    let mut session = open_session(&manager)?;

    let code = session.generate(id, &StandardGenerator::new())?;
    let record = session.get(id)?;
    output::print_code(record, &code);

    if record.kind == OtpKind::Totp {
        output::tip(&format!("Valid for {}s", otp::seconds_remaining()));
    }

    if !no_clip && manager.settings().copy_to_clipboard {
        let mut clip = clipboard::detect();
        copy_code(clip.as_mut(), &code);
    }

    Ok(())
}

/// Copy a code, warning instead of failing when no clipboard exists.
fn copy_code(clip: &mut dyn ClipboardProvider, code: &str) {
    if !clip.is_available() {
        output::warning("No clipboard available; code not copied.");
        return;
    }
    match clip.copy(code) {
        Ok(()) => output::info("Copied to clipboard."),
        Err(e) => output::warning(&e.to_string()),
    }
}
