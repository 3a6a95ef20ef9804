//! `otpvault import`: import tokens from an interchange file.
//!
//! Import is best-effort: entries that fail to parse, or duplicate a
//! stored token, are reported and skipped.

use std::fs;
use std::path::Path;

use crate::bridge::Format;
use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::errors::{OtpVaultError, Result};

/// Execute the `import` command.
pub fn execute(cli: &Cli, source: &Path, format: Option<&str>) -> Result<()> {
    if !source.exists() {
        return Err(OtpVaultError::CommandFailed(format!(
            "import file not found: {}",
            source.display()
        )));
    }

    // Detect format from flag or file extension.
    let format: Format = match format {
        Some(f) => f.parse()?,
        None => detect_format(source),
    };

    let text = fs::read_to_string(source)?;

    let manager = manager(cli)?;
    let mut session = open_session(&manager)?;
    let report = session.import(&text, format)?;

    for entry in &report.errors {
        output::warning(&entry.to_string());
    }

    if report.imported.is_empty() {
        output::warning(&format!("No tokens imported from {}.", source.display()));
        return Ok(());
    }

    output::success(&format!(
        "Imported {} token(s) from {} ({} skipped)",
        report.imported.len(),
        source.display(),
        report.errors.len()
    ));

    Ok(())
}

/// Guess the format from a file extension: `.csv`, `.json`, else URIs.
fn detect_format(path: &Path) -> Format {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("csv") => Format::Csv,
        Some("json") => Format::Json,
        _ => Format::Uri,
    }
}
