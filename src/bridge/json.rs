//! Native JSON interchange.
//!
//! Export writes an `InterchangeDocument` carrying every field of every
//! record.  Import accepts that document and also the older bare-array
//! layout, where entries use `type`/`label` and counters may be strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{OtpVaultError, Result};
use crate::vault::format::FORMAT_VERSION;
use crate::vault::record::{NewRecord, OtpKind, TokenRecord};

use super::{EntryError, ParsedBatch};

/// Top-level JSON export document.
#[derive(Debug, Serialize)]
struct InterchangeDocument<'a> {
    format_version: u32,
    exported_at: DateTime<Utc>,
    records: &'a [TokenRecord],
}

/// One imported entry, tolerant of both native and legacy field names.
#[derive(Debug, Deserialize)]
struct ImportEntry {
    secret: String,
    #[serde(default)]
    issuer: String,
    #[serde(alias = "label")]
    account: String,
    #[serde(alias = "type")]
    kind: String,
    #[serde(default)]
    counter: Option<CounterField>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    tags: Option<TagsField>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    last_used_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CounterField {
    Number(u64),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagsField {
    List(Vec<String>),
    Joined(String),
}

pub fn export(records: &[TokenRecord]) -> Result<String> {
    let doc = InterchangeDocument {
        format_version: FORMAT_VERSION,
        exported_at: Utc::now(),
        records,
    };
    serde_json::to_string_pretty(&doc)
        .map_err(|e| OtpVaultError::SerializationError(format!("json export: {e}")))
}

pub fn import(text: &str) -> Result<ParsedBatch> {
    let root: Value = serde_json::from_str(text).map_err(|e| OtpVaultError::Parse {
        entry: 0,
        message: format!("not a JSON document: {e}"),
    })?;

    let entries = match root {
        Value::Array(entries) => entries,
        Value::Object(mut map) => {
            if let Some(version) = map.get("format_version").and_then(Value::as_u64) {
                if version != u64::from(FORMAT_VERSION) {
                    tracing::warn!(
                        found = version,
                        expected = FORMAT_VERSION,
                        "importing JSON written by a different format version"
                    );
                }
            }
            match map.remove("records") {
                Some(Value::Array(entries)) => entries,
                _ => {
                    return Err(OtpVaultError::Parse {
                        entry: 0,
                        message: "expected a 'records' array".into(),
                    })
                }
            }
        }
        _ => {
            return Err(OtpVaultError::Parse {
                entry: 0,
                message: "expected an array or an object with 'records'".into(),
            })
        }
    };

    let mut batch = ParsedBatch::default();
    for (index, value) in entries.into_iter().enumerate() {
        let entry = index + 1;
        match parse_entry(value) {
            Ok(record) => batch.records.push((entry, record)),
            Err(message) => batch.errors.push(EntryError::parse(entry, message)),
        }
    }
    Ok(batch)
}

fn parse_entry(value: Value) -> std::result::Result<NewRecord, String> {
    let entry: ImportEntry = serde_json::from_value(value).map_err(|e| e.to_string())?;

    let kind: OtpKind = entry.kind.parse().map_err(|e: OtpVaultError| e.to_string())?;

    let counter = match entry.counter {
        None => 0,
        Some(CounterField::Number(n)) => n,
        Some(CounterField::Text(s)) if s.trim().is_empty() => 0,
        Some(CounterField::Text(s)) => s
            .trim()
            .parse()
            .map_err(|_| format!("counter '{s}' is not a non-negative integer"))?,
    };

    let tags = match entry.tags {
        None => Vec::new(),
        Some(TagsField::List(tags)) => tags,
        Some(TagsField::Joined(s)) => s.split(';').map(str::to_string).collect(),
    };

    let mut record = NewRecord::new(entry.secret, entry.issuer, entry.account, kind)
        .with_counter(counter)
        .with_tags(tags);
    record.category = entry.category;
    record.created_at = entry.created_at;
    record.last_used_at = entry.last_used_at;
    Ok(record)
}
