//! Process-wide counters for index activity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static INDEX_INSERTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static INDEX_DELETES_TOTAL: AtomicU64 = AtomicU64::new(0);
static INDEX_ROTATIONS_TOTAL: AtomicU64 = AtomicU64::new(0);
static INDEX_FIXUP_STEPS_TOTAL: AtomicU64 = AtomicU64::new(0);
static INDEX_COLOR_FLIPS_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Snapshot of index metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct IndexMetricsSnapshot {
    /// Inserts that added a node.
    pub inserts_total: u64,
    /// Deletes that removed a node.
    pub deletes_total: u64,
    /// Left and right rotations.
    pub rotations_total: u64,
    /// Iterations of the insert and delete fix-up loops.
    pub fixup_steps_total: u64,
    /// Color flips across all indexes.
    pub color_flips_total: u64,
}

impl fmt::Display for IndexMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "index_inserts={} index_deletes={} index_rotations={} index_fixup_steps={} index_color_flips={}",
            self.inserts_total,
            self.deletes_total,
            self.rotations_total,
            self.fixup_steps_total,
            self.color_flips_total,
        )
    }
}

/// Return a snapshot of index metrics.
#[must_use]
pub fn index_metrics_snapshot() -> IndexMetricsSnapshot {
    IndexMetricsSnapshot {
        inserts_total: INDEX_INSERTS_TOTAL.load(Ordering::Relaxed),
        deletes_total: INDEX_DELETES_TOTAL.load(Ordering::Relaxed),
        rotations_total: INDEX_ROTATIONS_TOTAL.load(Ordering::Relaxed),
        fixup_steps_total: INDEX_FIXUP_STEPS_TOTAL.load(Ordering::Relaxed),
        color_flips_total: INDEX_COLOR_FLIPS_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset index metrics.
pub fn reset_index_metrics() {
    INDEX_INSERTS_TOTAL.store(0, Ordering::Relaxed);
    INDEX_DELETES_TOTAL.store(0, Ordering::Relaxed);
    INDEX_ROTATIONS_TOTAL.store(0, Ordering::Relaxed);
    INDEX_FIXUP_STEPS_TOTAL.store(0, Ordering::Relaxed);
    INDEX_COLOR_FLIPS_TOTAL.store(0, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_insert() {
    INDEX_INSERTS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_delete() {
    INDEX_DELETES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_rotation() {
    INDEX_ROTATIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_fixup_step() {
    INDEX_FIXUP_STEPS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

#[inline]
pub(crate) fn record_color_flips(flips: u64) {
    INDEX_COLOR_FLIPS_TOTAL.fetch_add(flips, Ordering::Relaxed);
}
