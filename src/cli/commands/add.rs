//! `otpvault add`: store a new token.

use crate::bridge::uri::parse_uri;
use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::errors::{OtpVaultError, Result};
use crate::vault::{NewRecord, OtpKind};

/// Token fields as given on the command line.
pub struct AddArgs<'a> {
    pub secret: Option<&'a str>,
    pub issuer: &'a str,
    pub account: Option<&'a str>,
    pub kind: &'a str,
    pub counter: u64,
    pub uri: Option<&'a str>,
    pub category: Option<&'a str>,
    pub tags: &'a [String],
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: &AddArgs<'_>) -> Result<()> {
    // Parse before unlocking so typos fail fast.
    let new = build_record(args)?;

    let manager = manager(cli)?;
    let mut session = open_session(&manager)?;
    let record = session.add(new)?;

    output::success(&format!(
        "Added token {} ({} / {}, {})",
        record.id,
        record.issuer,
        record.account,
        record.kind.as_str().to_uppercase()
    ));
    output::tip(&format!("Run `otpvault generate {}` to get a code.", record.id));

    Ok(())
}

fn build_record(args: &AddArgs<'_>) -> Result<NewRecord> {
    let mut new = match args.uri {
        Some(uri) => parse_uri(uri).map_err(|message| OtpVaultError::Parse { entry: 1, message })?,
        None => {
            let kind: OtpKind = args.kind.parse()?;
            let secret = args
                .secret
                .ok_or_else(|| OtpVaultError::InvalidSecret("no secret given".into()))?;
            NewRecord::new(secret, args.issuer, args.account.unwrap_or_default(), kind)
                .with_counter(args.counter)
        }
    };

    if let Some(category) = args.category {
        new = new.with_category(category);
    }
    if !args.tags.is_empty() {
        new = new.with_tags(args.tags.iter().cloned());
    }
    Ok(new)
}
