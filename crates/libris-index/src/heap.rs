//! Array-backed binary min-heap of pending reservations.
//!
//! Entries are ordered lexicographically by `(priority, sequence)`. The patron
//! identifier never takes part in a comparison, so two entries at the same
//! priority always resolve by arrival order.
//!
//! The heap does not enforce a capacity. Bounding the waitlist is policy and
//! lives with the record that owns the heap.

use libris_types::{PatronId, Priority, Sequence};

/// A single pending reservation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ReservationEntry {
    pub priority: Priority,
    pub patron: PatronId,
    pub sequence: Sequence,
}

impl ReservationEntry {
    #[inline]
    pub const fn new(patron: PatronId, priority: Priority, sequence: Sequence) -> Self {
        Self {
            priority,
            patron,
            sequence,
        }
    }

    /// Sort key used by every heap comparison.
    #[inline]
    pub const fn rank(&self) -> (Priority, Sequence) {
        (self.priority, self.sequence)
    }

    /// Whether `self` must be served before `other`.
    #[inline]
    fn precedes(&self, other: &Self) -> bool {
        self.rank() < other.rank()
    }
}

/// Binary min-heap keyed on `(priority, sequence)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationHeap {
    entries: Vec<ReservationEntry>,
}

impl ReservationHeap {
    #[inline]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Admit an entry and restore heap order. O(log n).
    pub fn push(&mut self, entry: ReservationEntry) {
        self.entries.push(entry);
        self.sift_up(self.entries.len() - 1);
        debug_assert!(self.is_heap(), "heap order violated after push");
    }

    /// The most urgent entry, if any.
    #[inline]
    pub fn peek(&self) -> Option<&ReservationEntry> {
        self.entries.first()
    }

    /// Remove and return the most urgent entry. O(log n).
    pub fn pop(&mut self) -> Option<ReservationEntry> {
        let last = self.entries.pop()?;
        if self.entries.is_empty() {
            return Some(last);
        }
        let top = std::mem::replace(&mut self.entries[0], last);
        self.sift_down(0);
        debug_assert!(self.is_heap(), "heap order violated after pop");
        Some(top)
    }

    /// Pop every entry, yielding them in strictly increasing rank order.
    pub fn drain_ordered(&mut self) -> Vec<ReservationEntry> {
        let mut drained = Vec::with_capacity(self.entries.len());
        while let Some(entry) = self.pop() {
            drained.push(entry);
        }
        drained
    }

    /// Entries in service order without consuming the heap.
    pub fn ordered(&self) -> Vec<ReservationEntry> {
        let mut sorted = self.entries.clone();
        sorted.sort_unstable_by_key(ReservationEntry::rank);
        sorted
    }

    /// Entries in backing-array order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReservationEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.entries[idx].precedes(&self.entries[parent]) {
                self.entries.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < len && self.entries[left].precedes(&self.entries[smallest]) {
                smallest = left;
            }
            if right < len && self.entries[right].precedes(&self.entries[smallest]) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.entries.swap(idx, smallest);
            idx = smallest;
        }
    }

    fn is_heap(&self) -> bool {
        (1..self.entries.len())
            .all(|idx| !self.entries[idx].precedes(&self.entries[(idx - 1) / 2]))
    }
}

impl<'a> IntoIterator for &'a ReservationHeap {
    type Item = &'a ReservationEntry;
    type IntoIter = std::slice::Iter<'a, ReservationEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
