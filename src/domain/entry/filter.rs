//! Listing filters.
//!
//! `EntryFilter` is evaluated in Rust by the in-memory and detached backends
//! and translated to SQL by the SQLite backend; both must agree on which
//! entries match and in what order.

use std::cmp::Ordering;

use crate::domain::foundation::AccountId;

use super::Entry;

/// How tombstones are treated by a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DeletedFilter {
    #[default]
    Exclude,
    Include,
    Only,
}

/// Which owners a listing covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AccountFilter {
    #[default]
    Any,
    /// Entries with no account (created before login).
    Unclaimed,
    Account(AccountId),
}

/// Listing order. Ties are always broken by id ascending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    UpdatedDesc,
    UpdatedAsc,
    CreatedDesc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryFilter {
    pub deleted: DeletedFilter,
    pub account: AccountFilter,
    pub dirty_only: bool,
    pub pending_enrichment: bool,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl EntryFilter {
    /// Live entries, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every entry, tombstones included.
    pub fn all() -> Self {
        Self::default().with_deleted(DeletedFilter::Include)
    }

    /// Entries a sync push still has to send, tombstones included.
    pub fn dirty() -> Self {
        Self {
            deleted: DeletedFilter::Include,
            dirty_only: true,
            ..Self::default()
        }
    }

    /// Live entries with no stored analysis.
    pub fn pending_enrichment() -> Self {
        Self {
            pending_enrichment: true,
            ..Self::default()
        }
    }

    /// Unclaimed entries, tombstones included.
    pub fn unclaimed() -> Self {
        Self {
            deleted: DeletedFilter::Include,
            account: AccountFilter::Unclaimed,
            ..Self::default()
        }
    }

    pub fn with_account(mut self, account_id: AccountId) -> Self {
        self.account = AccountFilter::Account(account_id);
        self
    }

    pub fn with_deleted(mut self, deleted: DeletedFilter) -> Self {
        self.deleted = deleted;
        self
    }

    pub fn ordered_by(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, entry: &Entry) -> bool {
        let deleted_ok = match self.deleted {
            DeletedFilter::Exclude => !entry.is_deleted(),
            DeletedFilter::Include => true,
            DeletedFilter::Only => entry.is_deleted(),
        };
        let account_ok = match &self.account {
            AccountFilter::Any => true,
            AccountFilter::Unclaimed => entry.account_id().is_none(),
            AccountFilter::Account(id) => entry.account_id() == Some(id),
        };

        deleted_ok
            && account_ok
            && (!self.dirty_only || entry.is_dirty())
            && (!self.pending_enrichment || entry.needs_analysis())
    }

    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        let primary = match self.order {
            SortOrder::UpdatedDesc => b.updated_at().cmp(a.updated_at()),
            SortOrder::UpdatedAsc => a.updated_at().cmp(b.updated_at()),
            SortOrder::CreatedDesc => b.created_at().cmp(a.created_at()),
        };
        primary.then_with(|| a.id().cmp(b.id()))
    }

    /// Filters, orders and truncates a materialised set of entries.
    pub fn apply<I>(&self, entries: I) -> Vec<Entry>
    where
        I: IntoIterator<Item = Entry>,
    {
        let mut matched: Vec<Entry> = entries.into_iter().filter(|e| self.matches(e)).collect();
        matched.sort_by(|a, b| self.compare(a, b));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}
