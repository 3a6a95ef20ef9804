//! Conversion between vault records and external representations.
//!
//! Three formats are supported:
//! - `json`: native interchange, every field of every record (`json`)
//! - `csv`: one row per token (`csv`)
//! - `uri`: `otpauth://` provisioning URIs, one per line (`uri`)
//!
//! Import is best-effort: a malformed entry is reported in
//! `ParsedBatch::errors` and the remaining entries still parse.  Only a
//! document that cannot be read at all (unparsable JSON, missing CSV
//! columns) fails the whole batch.

pub mod csv;
pub mod json;
pub mod uri;

use std::fmt;
use std::str::FromStr;

use crate::errors::{OtpVaultError, Result};
use crate::vault::record::{NewRecord, TokenRecord};

/// An interchange format identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Csv,
    Uri,
}

impl Format {
    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Uri => "uri",
        }
    }

    /// Conventional file extension for exported files.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Csv => "csv",
            Format::Uri => "txt",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = OtpVaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Format::Json),
            "csv" => Ok(Format::Csv),
            "uri" | "otpauth" => Ok(Format::Uri),
            other => Err(OtpVaultError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A failure tied to one entry of an import batch (1-based).
#[derive(Debug)]
pub struct EntryError {
    pub entry: usize,
    pub error: OtpVaultError,
}

impl EntryError {
    pub fn parse(entry: usize, message: impl Into<String>) -> Self {
        Self {
            entry,
            error: OtpVaultError::Parse {
                entry,
                message: message.into(),
            },
        }
    }
}

impl fmt::Display for EntryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            // Parse errors already name the entry.
            OtpVaultError::Parse { .. } => write!(f, "{}", self.error),
            other => write!(f, "entry {}: {other}", self.entry),
        }
    }
}

/// Result of parsing an import document.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    /// Successfully parsed entries with their entry number.
    pub records: Vec<(usize, NewRecord)>,
    pub errors: Vec<EntryError>,
}

/// Render `records` in `format`.
pub fn export(records: &[TokenRecord], format: Format) -> Result<String> {
    match format {
        Format::Json => json::export(records),
        Format::Csv => csv::export(records),
        Format::Uri => Ok(uri::export(records)),
    }
}

/// Parse `text` as `format`.
pub fn import(text: &str, format: Format) -> Result<ParsedBatch> {
    let batch = match format {
        Format::Json => json::import(text)?,
        Format::Csv => csv::import(text)?,
        Format::Uri => uri::import(text),
    };
    tracing::debug!(
        format = %format,
        parsed = batch.records.len(),
        failed = batch.errors.len(),
        "import batch parsed"
    );
    Ok(batch)
}
