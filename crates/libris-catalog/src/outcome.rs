//! Results of circulation operations.

use libris_types::{BookId, PatronId};

/// Result of [`Catalog::borrow`](crate::Catalog::borrow).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BorrowOutcome {
    /// The book was available and is now held by the patron.
    Granted { book: BookId, patron: PatronId },
    /// The book is out; the request joined its waitlist.
    Waitlisted { book: BookId, patron: PatronId },
    /// The waitlist is at capacity; the request was dropped.
    WaitlistFull { book: BookId, patron: PatronId },
    /// No such book.
    NotFound { book: BookId, patron: PatronId },
}

/// Result of [`Catalog::return_book`](crate::Catalog::return_book).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReturnOutcome {
    /// Returned with nobody waiting; the book is available again.
    Returned { book: BookId, patron: PatronId },
    /// Returned and immediately handed to the most urgent waiting patron.
    ReturnedAndReallocated {
        book: BookId,
        patron: PatronId,
        new_holder: PatronId,
    },
    /// The book is missing, not checked out, or held by someone else.
    Rejected { book: BookId, patron: PatronId },
}

/// Result of [`Catalog::remove`](crate::Catalog::remove).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoveOutcome {
    /// The book is gone; `cancelled` lists waiting patrons, most urgent first.
    Removed {
        book: BookId,
        cancelled: Vec<PatronId>,
    },
    NotFound { book: BookId },
}
