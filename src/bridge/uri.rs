//! `otpauth://` provisioning URIs, one per line.
//!
//! `otpauth://{totp|hotp}/{issuer}:{account}?secret=…&issuer=…[&counter=…]`
//!
//! The label halves are percent-encoded separately so a `:` inside an
//! issuer or account survives the round trip.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::Url;

use crate::vault::record::{NewRecord, OtpKind, TokenRecord};

use super::{EntryError, ParsedBatch};

pub const SCHEME: &str = "otpauth";

/// Unreserved characters (RFC 3986) stay literal, everything else is encoded.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Provisioning URI for one record.
pub fn to_uri(record: &TokenRecord) -> String {
    let account = encode(&record.account);
    let label = if record.issuer.is_empty() {
        account
    } else {
        format!("{}:{account}", encode(&record.issuer))
    };

    let mut params = vec![format!("secret={}", record.secret)];
    if !record.issuer.is_empty() {
        params.push(format!("issuer={}", encode(&record.issuer)));
    }
    if record.kind == OtpKind::Hotp {
        params.push(format!("counter={}", record.counter));
    }

    format!("{SCHEME}://{}/{label}?{}", record.kind, params.join("&"))
}

/// One URI per line.
pub fn export(records: &[TokenRecord]) -> String {
    let mut out = records.iter().map(to_uri).collect::<Vec<_>>().join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse a single provisioning URI.  The secret is not validated here;
/// the store does that when the record is added.
pub fn parse_uri(uri: &str) -> std::result::Result<NewRecord, String> {
    let url = Url::parse(uri.trim()).map_err(|e| format!("invalid URI: {e}"))?;

    if url.scheme() != SCHEME {
        return Err(format!(
            "expected scheme '{SCHEME}', got '{}'",
            url.scheme()
        ));
    }

    let kind: OtpKind = url
        .host_str()
        .unwrap_or_default()
        .parse()
        .map_err(|e: crate::errors::OtpVaultError| e.to_string())?;

    // Split before decoding: an encoded `%3A` is part of a label, not the separator.
    let path = url.path().strip_prefix('/').unwrap_or(url.path());
    let (path_issuer, account) = match path.split_once(':') {
        Some((issuer, account)) => (Some(decode(issuer)?), decode(account)?),
        None => (None, decode(path)?),
    };

    let mut secret = None;
    let mut param_issuer = None;
    let mut counter = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "secret" => secret = Some(value.into_owned()),
            "issuer" => param_issuer = Some(value.into_owned()),
            "counter" => {
                let parsed = value
                    .parse::<u64>()
                    .map_err(|_| format!("counter '{value}' is not a non-negative integer"))?;
                counter = Some(parsed);
            }
            // digits/period/algorithm/image: fixed or irrelevant here
            _ => {}
        }
    }

    let secret = secret
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| "missing 'secret' parameter".to_string())?;
    let issuer = param_issuer.or(path_issuer).unwrap_or_default();

    let counter = match (kind, counter) {
        (OtpKind::Hotp, Some(c)) => c,
        (OtpKind::Hotp, None) => {
            tracing::warn!(
                issuer = %issuer,
                "HOTP URI has no counter parameter, starting at 0"
            );
            0
        }
        (OtpKind::Totp, _) => 0,
    };

    Ok(NewRecord::new(secret, issuer, account, kind).with_counter(counter))
}

/// Parse one URI per line, skipping blank lines and `#` comments.
/// Entry numbers are 1-based line numbers.
pub fn import(text: &str) -> ParsedBatch {
    let mut batch = ParsedBatch::default();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let entry = index + 1;
        match parse_uri(line) {
            Ok(record) => batch.records.push((entry, record)),
            Err(message) => batch.errors.push(EntryError::parse(entry, message)),
        }
    }
    batch
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

fn decode(s: &str) -> std::result::Result<String, String> {
    percent_decode_str(s)
        .decode_utf8()
        .map(|c| c.trim().to_string())
        .map_err(|_| "label is not valid UTF-8 after percent-decoding".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(issuer: &str, account: &str, kind: OtpKind, counter: u64) -> TokenRecord {
        TokenRecord {
            id: 1,
            secret: "JBSWY3DPEHPK3PXP".into(),
            issuer: issuer.into(),
            account: account.into(),
            kind,
            counter,
            category: None,
            tags: Vec::new(),
            created_at: Utc::now(),
            last_used_at: None,
        }
    }

    #[test]
    fn totp_uri_has_no_counter() {
        let uri = to_uri(&record("Test", "a@b.com", OtpKind::Totp, 0));
        assert_eq!(
            uri,
            "otpauth://totp/Test:a%40b.com?secret=JBSWY3DPEHPK3PXP&issuer=Test"
        );
    }

    #[test]
    fn hotp_uri_carries_counter() {
        let uri = to_uri(&record("Bank", "me", OtpKind::Hotp, 42));
        assert!(uri.starts_with("otpauth://hotp/Bank:me?"));
        assert!(uri.ends_with("&counter=42"));
    }

    #[test]
    fn labels_are_percent_encoded_and_decoded() {
        let uri = to_uri(&record("My Co: EU", "first last@x.io", OtpKind::Totp, 0));
        assert!(uri.contains("My%20Co%3A%20EU:first%20last%40x.io"));

        let parsed = parse_uri(&uri).unwrap();
        assert_eq!(parsed.issuer, "My Co: EU");
        assert_eq!(parsed.account, "first last@x.io");
    }

    #[test]
    fn issuer_parameter_wins_over_label_prefix() {
        let parsed =
            parse_uri("otpauth://totp/Old:alice?secret=JBSWY3DPEHPK3PXP&issuer=New").unwrap();
        assert_eq!(parsed.issuer, "New");
        assert_eq!(parsed.account, "alice");
    }

    #[test]
    fn label_without_issuer() {
        let parsed = parse_uri("otpauth://totp/alice?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(parsed.issuer, "");
        assert_eq!(parsed.account, "alice");
    }

    #[test]
    fn hotp_without_counter_defaults_to_zero() {
        let parsed = parse_uri("otpauth://hotp/X:y?secret=JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(parsed.kind, OtpKind::Hotp);
        assert_eq!(parsed.counter, 0);
    }

    #[test]
    fn malformed_uris_are_rejected() {
        assert!(parse_uri("https://totp/x?secret=AAAA").is_err());
        assert!(parse_uri("otpauth://steam/x?secret=AAAA").is_err());
        assert!(parse_uri("otpauth://totp/x").is_err());
        assert!(parse_uri("otpauth://hotp/x?secret=AAAA&counter=-1").is_err());
        assert!(parse_uri("not a uri").is_err());
    }

    #[test]
    fn import_is_best_effort_per_line() {
        let text = "\
# exported tokens
otpauth://totp/A:a?secret=JBSWY3DPEHPK3PXP&issuer=A

garbage line
otpauth://hotp/B:b?secret=JBSWY3DPEHPK3PXP&issuer=B&counter=3
";
        let batch = import(text);
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[1].1.counter, 3);
        assert_eq!(batch.errors.len(), 1);
        assert_eq!(batch.errors[0].entry, 4);
    }
}
