//! Ordered catalog index for libris.
//!
//! - [`CatalogIndex`]: red-black tree keyed by [`BookId`](libris_types::BookId),
//!   with cumulative color-flip accounting.
//! - [`ReservationHeap`]: per-record binary min-heap of pending reservations,
//!   ordered by `(priority, sequence)`.
//! - [`CatalogRecord`]: the payload the catalog stores at each node.

pub mod heap;
pub mod index;
pub mod instrumentation;
pub mod record;


pub use heap::{ReservationEntry, ReservationHeap};
pub use index::{CatalogIndex, Iter, Neighbors};
pub use instrumentation::{IndexMetricsSnapshot, index_metrics_snapshot, reset_index_metrics};
pub use record::{CatalogRecord, WaitlistFull};
