//! `otpvault export`: export tokens in an interchange format.
//!
//! Supported formats:
//! - `json` (default): every field of every token
//! - `csv`: `id,secret,type,issuer,account,counter,category,tags`
//! - `uri`: one `otpauth://` URI per line
//!
//! Exports contain plaintext secrets.

use std::fs;
use std::path::Path;

use crate::bridge::Format;
use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::errors::{OtpVaultError, Result};

/// Execute the `export` command.
pub fn execute(cli: &Cli, format: &str, output_path: Option<&Path>) -> Result<()> {
    let format: Format = format.parse()?;

    let manager = manager(cli)?;
    let session = open_session(&manager)?;
    let content = session.export(format)?;
    let count = session.store().len();

    match output_path {
        Some(dest) => {
            // Refuse to clobber the vault or a backup.
            if dest.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("bin")) {
                return Err(OtpVaultError::CommandFailed(
                    "refusing to export over a .bin file".into(),
                ));
            }

            write_private(dest, &content).map_err(|e| {
                OtpVaultError::CommandFailed(format!("failed to write export file: {e}"))
            })?;

            output::success(&format!(
                "Exported {count} token(s) to {} (format: {format})",
                dest.display()
            ));
            output::warning("The export contains plaintext secrets. Store it safely.");
        }
        None => {
            // Write to stdout (no success message, just raw output).
            print!("{content}");
            if !content.ends_with('\n') {
                println!();
            }
        }
    }

    Ok(())
}

/// Write a file readable only by the owner.
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    fs::write(path, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
