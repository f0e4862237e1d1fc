//! Catalog record: the payload stored at each index node.

use libris_types::{BookId, PatronId};

use crate::heap::{ReservationEntry, ReservationHeap};

/// A book and its circulation state.
///
/// `available` is `false` whenever `held_by` is set. A record may be
/// unavailable with no holder (it was inserted that way); reservations queue
/// against it all the same.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    id: BookId,
    title: String,
    author: String,
    available: bool,
    held_by: Option<PatronId>,
    waitlist: ReservationHeap,
}

/// Returned by [`CatalogRecord::reserve`] when the waitlist is at capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitlistFull {
    pub rejected: ReservationEntry,
    pub capacity: usize,
}

impl CatalogRecord {
    pub fn new(
        id: BookId,
        title: impl Into<String>,
        author: impl Into<String>,
        available: bool,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            author: author.into(),
            available,
            held_by: None,
            waitlist: ReservationHeap::new(),
        }
    }

    #[inline]
    pub const fn id(&self) -> BookId {
        self.id
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn author(&self) -> &str {
        &self.author
    }

    #[inline]
    pub const fn is_available(&self) -> bool {
        self.available
    }

    #[inline]
    pub const fn held_by(&self) -> Option<PatronId> {
        self.held_by
    }

    #[inline]
    pub const fn waitlist(&self) -> &ReservationHeap {
        &self.waitlist
    }

    /// Hand the book to `patron`. The record must be available.
    pub fn check_out(&mut self, patron: PatronId) {
        debug_assert!(self.available, "check_out on unavailable book {}", self.id);
        self.available = false;
        self.held_by = Some(patron);
    }

    /// Queue a reservation unless the waitlist already holds `capacity` entries.
    pub fn reserve(
        &mut self,
        entry: ReservationEntry,
        capacity: usize,
    ) -> Result<(), WaitlistFull> {
        if self.waitlist.len() >= capacity {
            return Err(WaitlistFull {
                rejected: entry,
                capacity,
            });
        }
        self.waitlist.push(entry);
        Ok(())
    }

    /// Release the current hold.
    ///
    /// The most urgent waiting patron becomes the new holder and is returned;
    /// with an empty waitlist the book becomes available and `None` is returned.
    pub fn release_to_next(&mut self) -> Option<PatronId> {
        if let Some(next) = self.waitlist.pop() {
            self.available = false;
            self.held_by = Some(next.patron);
            Some(next.patron)
        } else {
            self.available = true;
            self.held_by = None;
            None
        }
    }

    /// Remove every pending reservation, most urgent first.
    pub fn cancel_reservations(&mut self) -> Vec<ReservationEntry> {
        self.waitlist.drain_ordered()
    }
}
