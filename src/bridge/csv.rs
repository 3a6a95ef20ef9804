//! CSV interchange: one row per token.
//!
//! Header: `id,secret,type,issuer,account,counter,category,tags`, tags
//! joined with `;`.  Import locates columns by header name (`label` is
//! accepted for `account`, `kind` for `type`) and rejects any row whose
//! field count differs from the header.

use crate::errors::{OtpVaultError, Result};
use crate::vault::record::{NewRecord, OtpKind, TokenRecord};

use super::{EntryError, ParsedBatch};

pub const HEADER: [&str; 8] = [
    "id", "secret", "type", "issuer", "account", "counter", "category", "tags",
];

const TAG_SEPARATOR: char = ';';

pub fn export(records: &[TokenRecord]) -> Result<String> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).map_err(csv_error)?;

    for r in records {
        let id = r.id.to_string();
        let counter = r.counter.to_string();
        let tags = r.tags.join(&TAG_SEPARATOR.to_string());
        writer
            .write_record([
                id.as_str(),
                r.secret.as_str(),
                r.kind.as_str(),
                r.issuer.as_str(),
                r.account.as_str(),
                counter.as_str(),
                r.category.as_deref().unwrap_or(""),
                tags.as_str(),
            ])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| OtpVaultError::SerializationError(format!("csv export: {e}")))?;
    String::from_utf8(bytes)
        .map_err(|e| OtpVaultError::SerializationError(format!("csv export: {e}")))
}

/// Column positions resolved from the header row.
struct Columns {
    secret: usize,
    kind: usize,
    issuer: usize,
    account: usize,
    counter: Option<usize>,
    category: Option<usize>,
    tags: Option<usize>,
}

impl Columns {
    fn resolve(header: &::csv::StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            header
                .iter()
                .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| OtpVaultError::Parse {
                entry: 0,
                message: format!("CSV header has no '{}' column", names[0]),
            })
        };

        Ok(Self {
            secret: require(&["secret"])?,
            kind: require(&["type", "kind"])?,
            issuer: require(&["issuer"])?,
            account: require(&["account", "label"])?,
            counter: find(&["counter"]),
            category: find(&["category"]),
            tags: find(&["tags"]),
        })
    }

    fn parse_row(&self, row: &::csv::StringRecord) -> std::result::Result<NewRecord, String> {
        let field = |i: usize| row.get(i).unwrap_or("").trim();
        let optional = |i: Option<usize>| i.map(field).filter(|v| !v.is_empty());

        let kind: OtpKind = field(self.kind)
            .parse()
            .map_err(|e: OtpVaultError| e.to_string())?;

        let counter = match optional(self.counter) {
            None => 0,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| format!("counter '{raw}' is not a non-negative integer"))?,
        };

        let tags: Vec<&str> = optional(self.tags)
            .map(|t| t.split(TAG_SEPARATOR).collect())
            .unwrap_or_default();

        let mut record = NewRecord::new(
            field(self.secret),
            field(self.issuer),
            field(self.account),
            kind,
        )
        .with_counter(counter)
        .with_tags(tags);
        record.category = optional(self.category).map(str::to_string);
        Ok(record)
    }
}

pub fn import(text: &str) -> Result<ParsedBatch> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .trim(::csv::Trim::Headers)
        .from_reader(text.as_bytes());

    let header = reader.headers().map_err(|e| OtpVaultError::Parse {
        entry: 0,
        message: format!("unreadable CSV header: {e}"),
    })?;
    let header = header.clone();
    let columns = Columns::resolve(&header)?;

    let mut batch = ParsedBatch::default();
    for (index, row) in reader.records().enumerate() {
        let entry = index + 1;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                batch.errors.push(EntryError::parse(entry, e.to_string()));
                continue;
            }
        };

        if row.len() != header.len() {
            batch.errors.push(EntryError::parse(
                entry,
                format!("expected {} fields, found {}", header.len(), row.len()),
            ));
            continue;
        }

        match columns.parse_row(&row) {
            Ok(record) => batch.records.push((entry, record)),
            Err(message) => batch.errors.push(EntryError::parse(entry, message)),
        }
    }
    Ok(batch)
}

fn csv_error(e: ::csv::Error) -> OtpVaultError {
    OtpVaultError::SerializationError(format!("csv export: {e}"))
}
