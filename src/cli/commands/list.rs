//! `otpvault list`: display tokens in a table.

use crate::cli::output;
use crate::cli::{manager, open_session, Cli};
use crate::errors::Result;
use crate::vault::ListFilter;

/// Execute the `list` command.
pub fn execute(cli: &Cli, search: Option<&str>, category: Option<&str>) -> Result<()> {
    let manager = manager(cli)?;
    let session = open_session(&manager)?;

    let mut filter = ListFilter::default();
    if let Some(text) = search {
        filter = filter.search(text);
    }
    if let Some(cat) = category {
        filter = filter.category(cat);
    }

    let records = session.list(&filter);

    output::info(&format!(
        "{} of {} token(s)",
        records.len(),
        session.store().len()
    ));

    output::print_tokens_table(&records);

    Ok(())
}
