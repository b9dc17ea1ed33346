//! Per-reader epoch counters.
//!
//! Every reader owns one monotonically non-decreasing counter whose parity
//! encodes the read window: even outside a read, odd inside. The reader
//! increments with `Release` on entry and exit; the writer loads with
//! `Acquire` while refreshing. A counter that is odd at snapshot time marks
//! a straggler; any later change proves the straggler left the read it was
//! in, because a subsequent read window acquire-loads the already-swapped
//! publication pointer.

use std::sync::atomic::{AtomicU64, Ordering};

/// One reader's epoch counter. Starts at zero: even, outside a read.
#[derive(Debug, Default)]
pub(crate) struct ReadEpoch {
    count: AtomicU64,
}

impl ReadEpoch {
    pub(crate) fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Open a read window, flipping the counter odd.
    ///
    /// The returned guard flips it back to even on drop, so the window
    /// closes even when the read closure unwinds.
    ///
    /// # Panics
    ///
    /// Panics if the counter is already odd: the owning thread re-entered
    /// a read on the same handle, which the protocol forbids.
    pub(crate) fn enter(&self) -> WindowGuard<'_> {
        let seen = self.count.load(Ordering::Relaxed);
        assert!(
            seen % 2 == 0,
            "re-entrant read on a single reader handle (epoch {seen})"
        );
        self.count.fetch_add(1, Ordering::Release);
        WindowGuard { epoch: self }
    }

    /// Current counter value, synchronized with the owning reader's
    /// window transitions.
    pub(crate) fn observe(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Whether a raw counter value denotes an in-progress read.
    pub(crate) fn is_in_read(value: u64) -> bool {
        value % 2 == 1
    }
}

/// Open read window; closes (epoch back to even) when dropped.
pub(crate) struct WindowGuard<'a> {
    epoch: &'a ReadEpoch,
}

impl Drop for WindowGuard<'_> {
    fn drop(&mut self) {
        self.epoch.count.fetch_add(1, Ordering::Release);
    }
}
