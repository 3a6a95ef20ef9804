//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::vault::{OtpKind, TokenRecord, ValidationResult};

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of tokens.  Secrets are never shown.
pub fn print_tokens_table(records: &[&TokenRecord]) {
    if records.is_empty() {
        info("No tokens match.");
        tip("Run `otpvault add --secret <BASE32> --issuer <NAME> --account <LABEL>` to add one.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        "ID", "Issuer", "Account", "Type", "Counter", "Category", "Tags", "Last used",
    ]);

    for r in records {
        let counter = match r.kind {
            OtpKind::Hotp => r.counter.to_string(),
            OtpKind::Totp => "-".to_string(),
        };
        table.add_row(vec![
            r.id.to_string(),
            r.issuer.clone(),
            r.account.clone(),
            r.kind.as_str().to_uppercase(),
            counter,
            r.category.clone().unwrap_or_default(),
            r.tags.join(", "),
            r.last_used_at
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string()),
        ]);
    }

    println!("{table}");
}

/// Print a one-time code prominently.
pub fn print_code(record: &TokenRecord, code: &str) {
    let label = if record.issuer.is_empty() {
        record.account.clone()
    } else {
        format!("{} ({})", record.issuer, record.account)
    };
    println!("{}  {}", style(code).bold().cyan(), style(label).dim());
}

/// Print validation results, one line per token.
pub fn print_validation(results: &[ValidationResult]) {
    for r in results {
        match &r.error {
            None => success(&format!("[{}] {} / {}", r.id, r.issuer, r.account)),
            Some(e) => error(&format!("[{}] {} / {}: {e}", r.id, r.issuer, r.account)),
        }
    }
}
