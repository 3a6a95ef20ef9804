//! Token records stored inside a vault.
//!
//! A `TokenRecord` is one provisioned OTP credential: the shared secret
//! (base32 text), the labels shown to the user, the OTP kind, and the
//! HOTP counter.  `NewRecord` is the same data before the store assigns
//! an id and timestamps.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{OtpVaultError, Result};

/// The OTP algorithm family of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpKind {
    /// Time-based (RFC 6238).
    Totp,
    /// Counter-based (RFC 4226).
    Hotp,
}

impl OtpKind {
    /// Lowercase name as used in provisioning URIs (`totp` / `hotp`).
    pub fn as_str(self) -> &'static str {
        match self {
            OtpKind::Totp => "totp",
            OtpKind::Hotp => "hotp",
        }
    }
}

impl fmt::Display for OtpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OtpKind {
    type Err = OtpVaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "totp" => Ok(OtpKind::Totp),
            "hotp" => Ok(OtpKind::Hotp),
            other => Err(OtpVaultError::InvalidKind(format!(
                "'{other}' (expected 'totp' or 'hotp')"
            ))),
        }
    }
}

/// A single OTP credential stored in the vault.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// Stable positive id, never reused after removal.
    pub id: u64,

    /// Normalised base32 shared secret.
    pub secret: String,

    /// Service name (e.g. "GitHub").
    pub issuer: String,

    /// Account label (e.g. "alice@example.com").
    pub account: String,

    pub kind: OtpKind,

    /// Next HOTP counter to use. Always 0 for TOTP.
    #[serde(default)]
    pub counter: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
}

impl TokenRecord {
    /// Case-insensitive match against issuer, account, category and tags.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_search(&self, needle: &str) -> bool {
        self.issuer.to_lowercase().contains(needle)
            || self.account.to_lowercase().contains(needle)
            || self
                .category
                .as_deref()
                .is_some_and(|c| c.to_lowercase().contains(needle))
            || self.tags.iter().any(|t| t.to_lowercase().contains(needle))
    }

    /// Whether this record and `other` share the identity tuple
    /// `(secret, kind, issuer, account)`.
    pub(crate) fn same_identity(&self, other: &NewRecord) -> bool {
        self.secret == other.secret
            && self.kind == other.kind
            && self.issuer == other.issuer
            && self.account == other.account
    }

    /// The secret with everything but the first and last two characters masked.
    pub fn masked_secret(&self) -> String {
        mask_secret(&self.secret)
    }
}

// Never print the secret, even in debug output.
impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenRecord")
            .field("id", &self.id)
            .field("secret", &self.masked_secret())
            .field("issuer", &self.issuer)
            .field("account", &self.account)
            .field("kind", &self.kind)
            .field("counter", &self.counter)
            .field("category", &self.category)
            .field("tags", &self.tags)
            .field("created_at", &self.created_at)
            .field("last_used_at", &self.last_used_at)
            .finish()
    }
}

/// A token that has not been added to a store yet.
#[derive(Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub secret: String,
    pub issuer: String,
    pub account: String,
    pub kind: OtpKind,
    pub counter: u64,
    pub category: Option<String>,
    pub tags: Vec<String>,
    /// Carried over from an export; `None` means "now".
    pub created_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl NewRecord {
    /// A record with no metadata and a zero counter.
    pub fn new(
        secret: impl Into<String>,
        issuer: impl Into<String>,
        account: impl Into<String>,
        kind: OtpKind,
    ) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            account: account.into(),
            kind,
            counter: 0,
            category: None,
            tags: Vec::new(),
            created_at: None,
            last_used_at: None,
        }
    }

    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = counter;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Keep the timestamps of a previously exported record.
    pub fn with_timestamps(
        mut self,
        created_at: DateTime<Utc>,
        last_used_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = Some(created_at);
        self.last_used_at = last_used_at;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Normalise the secret, trim labels, drop empty/duplicate tags and
    /// force the counter to 0 for TOTP.  Fails if the secret is not
    /// valid base32.
    pub(crate) fn normalized(mut self) -> Result<Self> {
        self.secret = normalize_secret(&self.secret)?;
        self.issuer = self.issuer.trim().to_string();
        self.account = self.account.trim().to_string();
        self.category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim().to_string();
            if !tag.is_empty() && !tags.contains(&tag) {
                tags.push(tag);
            }
        }
        self.tags = tags;

        if self.kind == OtpKind::Totp {
            self.counter = 0;
        }
        Ok(self)
    }
}

impl fmt::Debug for NewRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRecord")
            .field("secret", &mask_secret(&self.secret))
            .field("issuer", &self.issuer)
            .field("account", &self.account)
            .field("kind", &self.kind)
            .field("counter", &self.counter)
            .field("category", &self.category)
            .field("tags", &self.tags)
            .field("created_at", &self.created_at)
            .field("last_used_at", &self.last_used_at)
            .finish()
    }
}

/// Canonicalise a base32 secret: uppercase, no whitespace, dashes or
/// `=` padding.  Fails with `InvalidSecret` when the result is empty or
/// does not decode as RFC 4648 base32.
pub fn normalize_secret(secret: &str) -> Result<String> {
    let cleaned: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-' && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.is_empty() {
        return Err(OtpVaultError::InvalidSecret("secret is empty".into()));
    }

    match decode_secret(&cleaned) {
        Some(bytes) if !bytes.is_empty() => Ok(cleaned),
        _ => Err(OtpVaultError::InvalidSecret(
            "secret is not valid base32 (A-Z, 2-7)".into(),
        )),
    }
}

/// Decode a normalised base32 secret into raw key bytes.
pub fn decode_secret(secret: &str) -> Option<Vec<u8>> {
    base32::decode(base32::Alphabet::Rfc4648 { padding: false }, secret)
}

fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let head: String = secret.chars().take(2).collect();
    let tail: String = secret.chars().skip(len - 2).collect();
    format!("{head}{}{tail}", "*".repeat(len - 4))
}
