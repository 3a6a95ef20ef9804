//! `otpvault qr`: show a token's provisioning URI as a QR code, for
//! moving it to a phone authenticator.

use std::fs;
use std::path::Path;

use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::errors::Result;
use crate::qr;

/// Execute the `qr` command.
pub fn execute(cli: &Cli, id: u64, output_path: Option<&Path>) -> Result<()> {
    let manager = manager(cli)?;
    let session = open_session(&manager)?;
    let uri = session.uri(id)?;

    match output_path {
        Some(dest) => {
            let png = qr::encode_png(&uri)?;
            fs::write(dest, png)?;
            output::success(&format!("Wrote QR code for token {id} to {}", dest.display()));
        }
        None => {
            println!("{}", qr::encode_terminal(&uri)?);
        }
    }

    output::warning("This QR code contains the token secret.");
    Ok(())
}
