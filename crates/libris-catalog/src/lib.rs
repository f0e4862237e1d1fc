//! Library circulation policy over the libris catalog index.
//!
//! [`Catalog`] owns the only [`CatalogIndex`](libris_index::CatalogIndex) and
//! applies borrowing rules on top of it: availability flags, waitlist
//! admission and promotion, and cancellation of pending reservations when a
//! book is removed. Every failure path is an outcome variant.

pub mod config;
pub mod outcome;
pub mod report;
pub mod service;

pub use config::{CatalogConfig, DEFAULT_WAITLIST_CAPACITY};
pub use outcome::{BorrowOutcome, RemoveOutcome, ReturnOutcome};
pub use report::BookReport;
pub use service::Catalog;
