//! Circulation service.

use libris_index::{CatalogIndex, CatalogRecord, ReservationEntry};
use libris_types::{BookId, PatronId, Priority, Sequence};
use tracing::{debug, warn};

use crate::config::CatalogConfig;
use crate::outcome::{BorrowOutcome, RemoveOutcome, ReturnOutcome};
use crate::report::BookReport;

/// Library catalog: books indexed by id, each with a bounded waitlist.
///
/// Single-threaded. Embedding it across threads requires a lock around the
/// whole catalog: rebalancing touches several nodes per call.
#[derive(Debug)]
pub struct Catalog {
    index: CatalogIndex<CatalogRecord>,
    config: CatalogConfig,
    next_sequence: Sequence,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Self::with_config(CatalogConfig::default())
    }

    pub fn with_config(config: CatalogConfig) -> Self {
        Self {
            index: CatalogIndex::new(),
            config,
            next_sequence: Sequence::FIRST,
        }
    }

    #[inline]
    pub const fn config(&self) -> &CatalogConfig {
        &self.config
    }

    #[inline]
    pub const fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The underlying index, for integrity checks and diagnostics.
    #[inline]
    pub const fn index(&self) -> &CatalogIndex<CatalogRecord> {
        &self.index
    }

    #[inline]
    pub const fn color_flip_count(&self) -> u64 {
        self.index.color_flip_count()
    }

    /// Add a book with an empty waitlist. Returns `false` (and changes
    /// nothing) if `id` is already catalogued.
    pub fn insert_book(
        &mut self,
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        available: bool,
    ) -> bool {
        if self.index.contains_key(id) {
            debug!(book = id.get(), "book already catalogued");
            return false;
        }
        self.index.insert(id, CatalogRecord::new(id, title, author, available))
    }

    /// Check out `book` to `patron`, or queue a reservation if it is out.
    pub fn borrow(&mut self, patron: PatronId, book: BookId, priority: Priority) -> BorrowOutcome {
        let capacity = self.config.waitlist_capacity();
        let Some(record) = self.index.get_mut(book) else {
            debug!(book = book.get(), patron = patron.get(), "borrow of unknown book");
            return BorrowOutcome::NotFound { book, patron };
        };

        if record.is_available() {
            record.check_out(patron);
            debug!(book = book.get(), patron = patron.get(), "book granted");
            return BorrowOutcome::Granted { book, patron };
        }

        let entry = ReservationEntry::new(patron, priority, self.next_sequence);
        match record.reserve(entry, capacity) {
            Ok(()) => {
                self.next_sequence = self.next_sequence.next();
                debug!(
                    book = book.get(),
                    patron = patron.get(),
                    priority = priority.get(),
                    waiting = record.waitlist().len(),
                    "reservation queued"
                );
                BorrowOutcome::Waitlisted { book, patron }
            }
            Err(full) => {
                warn!(
                    book = book.get(),
                    patron = full.rejected.patron.get(),
                    capacity = full.capacity,
                    "waitlist full, reservation dropped"
                );
                BorrowOutcome::WaitlistFull { book, patron }
            }
        }
    }

    /// Return `book` from `patron`, promoting the next waiting patron if any.
    pub fn return_book(&mut self, patron: PatronId, book: BookId) -> ReturnOutcome {
        let Some(record) = self.index.get_mut(book) else {
            return ReturnOutcome::Rejected { book, patron };
        };
        if record.is_available() || record.held_by() != Some(patron) {
            debug!(
                book = book.get(),
                patron = patron.get(),
                holder = ?record.held_by(),
                "return rejected"
            );
            return ReturnOutcome::Rejected { book, patron };
        }

        match record.release_to_next() {
            Some(new_holder) => {
                debug!(
                    book = book.get(),
                    patron = patron.get(),
                    new_holder = new_holder.get(),
                    "book returned and reallocated"
                );
                ReturnOutcome::ReturnedAndReallocated {
                    book,
                    patron,
                    new_holder,
                }
            }
            None => {
                debug!(book = book.get(), patron = patron.get(), "book returned");
                ReturnOutcome::Returned { book, patron }
            }
        }
    }

    /// Remove `book`, cancelling every pending reservation on it.
    pub fn remove(&mut self, book: BookId) -> RemoveOutcome {
        let Some(record) = self.index.get_mut(book) else {
            return RemoveOutcome::NotFound { book };
        };
        let cancelled: Vec<PatronId> = record
            .cancel_reservations()
            .into_iter()
            .map(|entry| entry.patron)
            .collect();
        self.index.remove(book);
        debug!(book = book.get(), cancelled = cancelled.len(), "book removed");
        RemoveOutcome::Removed { book, cancelled }
    }

    /// The stored record for `id`.
    pub fn record(&self, id: BookId) -> Option<&CatalogRecord> {
        self.index.get(id)
    }

    pub fn book(&self, id: BookId) -> Option<BookReport> {
        self.index.get(id).map(BookReport::from)
    }

    /// Books with `lo <= id <= hi`, ascending.
    pub fn books_in_range(&self, lo: BookId, hi: BookId) -> Vec<BookReport> {
        self.index
            .range(lo, hi)
            .into_iter()
            .map(|(_, record)| BookReport::from(record))
            .collect()
    }

    /// The book matching `target`, or the closest one(s) on either side.
    pub fn closest_books(&self, target: BookId) -> Vec<BookReport> {
        self.index
            .nearest(target)
            .into_iter()
            .map(|(_, record)| BookReport::from(record))
            .collect()
    }
}
