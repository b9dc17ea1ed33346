//! Process-wide counters for the left-right primitive.
//!
//! Global atomics with `Relaxed` ordering: no coordination added to the
//! paths being counted. Snapshot with [`leftright_metrics`]; tests can
//! [`reset_leftright_metrics`].

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

static LRKV_READS_TOTAL: AtomicU64 = AtomicU64::new(0);
static LRKV_REFRESHES_TOTAL: AtomicU64 = AtomicU64::new(0);
static LRKV_STRAGGLER_WAITS_TOTAL: AtomicU64 = AtomicU64::new(0);
static LRKV_READERS_CREATED_TOTAL: AtomicU64 = AtomicU64::new(0);

/// Snapshot of the primitive's global counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeftRightMetrics {
    /// Completed read windows across all readers.
    pub lrkv_reads_total: u64,
    /// Completed refresh cycles across all writers.
    pub lrkv_refreshes_total: u64,
    /// Stragglers the writer had to wait out during refreshes.
    pub lrkv_straggler_waits_total: u64,
    /// Readers registered since process start.
    pub lrkv_readers_created_total: u64,
}

/// Read the current counters.
#[must_use]
pub fn leftright_metrics() -> LeftRightMetrics {
    LeftRightMetrics {
        lrkv_reads_total: LRKV_READS_TOTAL.load(Ordering::Relaxed),
        lrkv_refreshes_total: LRKV_REFRESHES_TOTAL.load(Ordering::Relaxed),
        lrkv_straggler_waits_total: LRKV_STRAGGLER_WAITS_TOTAL.load(Ordering::Relaxed),
        lrkv_readers_created_total: LRKV_READERS_CREATED_TOTAL.load(Ordering::Relaxed),
    }
}

/// Reset all counters (for tests).
pub fn reset_leftright_metrics() {
    LRKV_READS_TOTAL.store(0, Ordering::Relaxed);
    LRKV_REFRESHES_TOTAL.store(0, Ordering::Relaxed);
    LRKV_STRAGGLER_WAITS_TOTAL.store(0, Ordering::Relaxed);
    LRKV_READERS_CREATED_TOTAL.store(0, Ordering::Relaxed);
}

pub(crate) fn record_read() {
    LRKV_READS_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_refresh() {
    LRKV_REFRESHES_TOTAL.fetch_add(1, Ordering::Relaxed);
}

pub(crate) fn record_straggler_waits(count: u64) {
    if count > 0 {
        LRKV_STRAGGLER_WAITS_TOTAL.fetch_add(count, Ordering::Relaxed);
    }
}

pub(crate) fn record_reader_created() {
    LRKV_READERS_CREATED_TOTAL.fetch_add(1, Ordering::Relaxed);
}
