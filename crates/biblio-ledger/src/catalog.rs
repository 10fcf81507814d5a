//! Title-keyed inventory owned by a single responder.
//!
//! A [`Catalog`] is never shared between agents: the seller or clerk that
//! owns it runs every check and mutation on its own task, so a check
//! followed by a [`Catalog::decrement`] inside one handler cannot interleave
//! with another request.
//!
//! Titles match without regard to case: "dune" finds the "Dune" entry,
//! which keeps its catalog spelling.

use std::collections::BTreeMap;

use biblio_proto::{BookRecord, SearchResult, WantedList};
use tracing::debug;

use crate::error::{LedgerError, Result};

/// Inventory keyed by case-folded title.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: BTreeMap<String, BookRecord>,
}

fn key(title: &str) -> String {
    title.to_lowercase()
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the entry for `record.title`, returning the previous one.
    ///
    /// Titles differing only in case share an entry.
    pub fn insert(&mut self, record: BookRecord) -> Option<BookRecord> {
        self.books.insert(key(&record.title), record)
    }

    /// Number of titles, including sold-out ones.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Returns true if the catalog has no titles.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Entries in case-folded title order.
    pub fn iter(&self) -> impl Iterator<Item = &BookRecord> {
        self.books.values()
    }

    /// Looks up a title.
    pub fn lookup(&self, title: &str) -> Option<&BookRecord> {
        self.books.get(&key(title))
    }

    /// Returns true if at least one copy of `title` is on hand.
    pub fn is_available(&self, title: &str) -> bool {
        self.is_available_count(title, 1)
    }

    /// Returns true if at least `count` copies of `title` are on hand.
    pub fn is_available_count(&self, title: &str, count: u32) -> bool {
        self.check(title, count).is_ok()
    }

    /// Checks that `count` copies of `title` could be taken.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidCount`] for a zero count,
    /// [`LedgerError::NotFound`] for an unknown title and
    /// [`LedgerError::InsufficientStock`] when fewer copies are on hand.
    pub fn check(&self, title: &str, count: u32) -> Result<&BookRecord> {
        if count == 0 {
            return Err(LedgerError::InvalidCount {
                title: title.to_string(),
            });
        }
        let record = self.lookup(title).ok_or_else(|| LedgerError::NotFound {
            title: title.to_string(),
        })?;
        if !record.has_copies(count) {
            return Err(LedgerError::InsufficientStock {
                title: title.to_string(),
                requested: count,
                available: record.quantity,
            });
        }
        Ok(record)
    }

    /// Takes `count` copies of `title` and returns the copies left.
    ///
    /// The entry is kept when it reaches zero.
    ///
    /// # Errors
    ///
    /// Same as [`Catalog::check`]; the catalog is unchanged on error.
    pub fn decrement(&mut self, title: &str, count: u32) -> Result<u32> {
        self.check(title, count)?;
        let record = self.books.get_mut(&key(title)).ok_or_else(|| LedgerError::NotFound {
            title: title.to_string(),
        })?;
        record.quantity -= count;
        debug!(title = %title, taken = count, remaining = record.quantity, "catalog decremented");
        Ok(record.quantity)
    }

    /// Partitions a wanted list into titles with at least one copy and the rest.
    ///
    /// Found entries keep the wanted-list order and carry a snapshot of the
    /// record at search time.
    pub fn search(&self, wanted: &WantedList) -> SearchResult {
        let mut result = SearchResult::new();
        for title in wanted.titles() {
            match self.check(title, 1) {
                Ok(record) => result.record_found(title.clone(), record.clone()),
                Err(_) => result.record_missing(title.clone()),
            }
        }
        result
    }
}

impl FromIterator<BookRecord> for Catalog {
    fn from_iter<I: IntoIterator<Item = BookRecord>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}
