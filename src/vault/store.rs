//! In-memory record set of an unlocked vault.
//!
//! `RecordStore` enforces the record invariants (unique identity tuple,
//! never-reused ids, monotonic HOTP counters).  It never touches disk;
//! persisting a store is the session's job.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::errors::{OtpVaultError, Result};

use super::record::{NewRecord, OtpKind, TokenRecord};

/// Optional filters for `RecordStore::list`.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Case-insensitive substring matched against issuer, account,
    /// category and tags.
    pub search: Option<String>,
    /// Exact (case-insensitive) category match.
    pub category: Option<String>,
}

impl ListFilter {
    pub fn search(mut self, text: impl Into<String>) -> Self {
        self.search = Some(text.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Ordered set of token records (storage order = insertion order).
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<TokenRecord>,
    /// High-water mark: the smallest id that has never been handed out.
    next_id: u64,
}

impl RecordStore {
    /// An empty store whose first record gets id 1.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a store from persisted parts.
    ///
    /// `next_id` is raised past the largest existing id so a stale or
    /// missing high-water mark can never cause id reuse.
    pub fn from_parts(records: Vec<TokenRecord>, next_id: u64) -> Self {
        let floor = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            records,
            next_id: next_id.max(floor),
        }
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    /// Add a new token and return the stored record.
    ///
    /// Fails with `InvalidSecret` if the secret is not base32 and with
    /// `DuplicateRecord` if a record with the same
    /// `(secret, kind, issuer, account)` already exists.
    pub fn add(&mut self, new: NewRecord) -> Result<&TokenRecord> {
        self.add_at(new, Utc::now())
    }

    pub(crate) fn add_at(&mut self, new: NewRecord, now: DateTime<Utc>) -> Result<&TokenRecord> {
        let new = new.normalized()?;

        if self.records.iter().any(|r| r.same_identity(&new)) {
            return Err(OtpVaultError::DuplicateRecord {
                issuer: new.issuer,
                account: new.account,
            });
        }

        let id = self.next_id;
        self.next_id += 1;

        self.records.push(TokenRecord {
            id,
            secret: new.secret,
            issuer: new.issuer,
            account: new.account,
            kind: new.kind,
            counter: new.counter,
            category: new.category,
            tags: new.tags,
            created_at: new.created_at.unwrap_or(now),
            last_used_at: new.last_used_at,
        });

        tracing::debug!(id, "record added");
        Ok(&self.records[self.records.len() - 1])
    }

    /// Remove a record by id and return it.  Ids are never recompacted.
    pub fn remove(&mut self, id: u64) -> Result<TokenRecord> {
        let index = self.index_of(id)?;
        tracing::debug!(id, "record removed");
        Ok(self.records.remove(index))
    }

    /// Advance an HOTP counter by one and return the value *before* the
    /// increment: the counter the caller must generate the code with.
    ///
    /// Fails with `InvalidKind` for TOTP records.
    pub fn touch_counter(&mut self, id: u64) -> Result<u64> {
        let record = self.get_mut(id)?;
        if record.kind != OtpKind::Hotp {
            return Err(OtpVaultError::InvalidKind(format!(
                "token {id} is time-based; only HOTP tokens have a counter"
            )));
        }

        let current = record.counter;
        record.counter = current.checked_add(1).ok_or_else(|| {
            OtpVaultError::CorruptStore(format!("counter of token {id} overflowed"))
        })?;
        record.last_used_at = Some(Utc::now());
        Ok(current)
    }

    /// Stamp `last_used_at` on a record.
    pub fn mark_used(&mut self, id: u64) -> Result<()> {
        self.get_mut(id)?.last_used_at = Some(Utc::now());
        Ok(())
    }

    /// Replace the whole record set (restore semantics: not a merge).
    pub fn replace_all(&mut self, records: Vec<TokenRecord>) {
        let floor = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        self.next_id = self.next_id.max(floor);
        self.records = records;
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Records matching `filter`, in storage order.
    pub fn list(&self, filter: &ListFilter) -> Vec<&TokenRecord> {
        let needle = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);
        let category = filter
            .category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());

        self.records
            .iter()
            .filter(|r| needle.as_deref().is_none_or(|n| r.matches_search(n)))
            .filter(|r| {
                category.is_none_or(|c| {
                    r.category
                        .as_deref()
                        .is_some_and(|rc| rc.eq_ignore_ascii_case(c))
                })
            })
            .collect()
    }

    /// Distinct categories across all records, in lexicographic order.
    pub fn categories(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter_map(|r| r.category.clone())
            .collect()
    }

    pub fn get(&self, id: u64) -> Result<&TokenRecord> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or(OtpVaultError::NotFound(id))
    }

    /// All records in storage order.
    pub fn records(&self) -> &[TokenRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The id the next `add` will assign.
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn index_of(&self, id: u64) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(OtpVaultError::NotFound(id))
    }

    fn get_mut(&mut self, id: u64) -> Result<&mut TokenRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(OtpVaultError::NotFound(id))
    }
}
