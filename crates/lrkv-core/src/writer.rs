//! The single writer: op-log, refresh protocol, scoped release.
//!
//! The writer owns the standby copy — the one the publication pointer does
//! not target. [`Writer::write`] mutates it immediately and logs the
//! operation; [`Writer::refresh`] publishes it, waits out stragglers, and
//! replays the log against the copy that was retired by the swap.
//!
//! ## Why refresh is safe
//!
//! After the publication swap, no new read can observe the retired copy. A
//! read that began before the swap has its epoch odd at snapshot time; once
//! that epoch changes the reader has left that read, and any read it starts
//! afterwards acquire-loads the already-swapped pointer. The drain loop
//! therefore proves the retired copy unobserved before any replay mutation
//! touches it.
//!
//! ## Logging
//!
//! - **DEBUG** `lrkv::core::refresh`: `refresh_complete` — straggler and
//!   replay counts for a finished refresh
//! - **TRACE** `lrkv::core::refresh`: `stragglers_drained` — drain loop wait

use crate::Shared;
use crate::epoch::ReadEpoch;
use crate::metrics;
use crate::op::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

/// Spin/yield tuning for the straggler drain loop.
///
/// The writer busy-spins up to `spin_limit` sweeps over the remaining
/// stragglers before it starts yielding the CPU between sweeps. There is no
/// timeout: refresh waits as long as a reader stays inside its read window,
/// so read closures are expected to be short and non-blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrainPolicy {
    /// Busy sweeps before the drain loop starts yielding.
    pub spin_limit: u32,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        Self { spin_limit: 128 }
    }
}

/// The single mutating handle.
///
/// Owned by exactly one thread (or otherwise externally serialized); the
/// primitive hands out one writer per [`create`](crate::create) call and
/// the writer is not cloneable.
pub struct Writer<C, O> {
    shared: Arc<Shared<C>>,
    /// The copy not reachable through the publication pointer.
    standby: Arc<C>,
    /// Operations applied to the standby copy since the last refresh,
    /// in program order.
    op_log: Vec<O>,
    drain: DrainPolicy,
}

impl<C, O: Operation<C>> Writer<C, O> {
    pub(crate) fn new(shared: Arc<Shared<C>>, standby: Arc<C>, drain: DrainPolicy) -> Self {
        Self {
            shared,
            standby,
            op_log: Vec::new(),
            drain,
        }
    }

    /// Apply `op` to the write-side copy, log it for replay, and return the
    /// application's result. Never blocks on readers.
    ///
    /// The operation is logged only after it returns: a panicking operation
    /// propagates to the caller without a partially-applied entry in the
    /// log.
    pub fn write(&mut self, op: O) -> O::Output {
        let out = op.apply(standby_mut(&mut self.standby));
        self.op_log.push(op);
        out
    }

    /// Read directly from the write-side copy.
    ///
    /// Sees every prior [`write`](Self::write), published or not, which
    /// makes composite read-modify-write sequences correct without extra
    /// synchronization.
    pub fn read<T>(&self, read: impl FnOnce(&C) -> T) -> T {
        read(&self.standby)
    }

    /// Number of operations written since the last refresh.
    #[must_use]
    pub fn pending_ops(&self) -> usize {
        self.op_log.len()
    }

    /// Publish all pending writes to readers.
    ///
    /// Swaps the publication pointer to the write-side copy, waits for
    /// readers that were mid-read inside the retired copy, then replays the
    /// op-log against that copy so the two converge. Readers are never
    /// blocked; only this call waits.
    pub fn refresh(&mut self) {
        // Publish and snapshot under the registry lock: no reader can be
        // registered between the swap and the straggler scan.
        let mut stragglers: Vec<(Arc<ReadEpoch>, u64)> = {
            let registry = self.shared.registry.lock();
            let retired = self.shared.published.swap(Arc::clone(&self.standby));
            self.standby = retired;
            registry
                .iter()
                .filter_map(|epoch| {
                    let seen = epoch.observe();
                    ReadEpoch::is_in_read(seen).then(|| (Arc::clone(epoch), seen))
                })
                .collect()
        };

        let straggler_count = stragglers.len();
        metrics::record_straggler_waits(straggler_count as u64);
        self.drain_stragglers(&mut stragglers);

        // The retired copy is now provably unobserved; bring it forward.
        let side = standby_mut(&mut self.standby);
        for op in &self.op_log {
            op.apply(side);
        }
        let replayed = self.op_log.len();
        self.op_log.clear();

        metrics::record_refresh();
        debug!(
            target: "lrkv::core::refresh",
            stragglers = straggler_count,
            replayed,
            "refresh_complete"
        );
    }

    /// Sweep the straggler set until every member's epoch has moved past
    /// the value observed at snapshot time.
    fn drain_stragglers(&self, stragglers: &mut Vec<(Arc<ReadEpoch>, u64)>) {
        if stragglers.is_empty() {
            return;
        }
        let mut sweeps = 0_u32;
        loop {
            stragglers.retain(|(epoch, seen)| epoch.observe() == *seen);
            if stragglers.is_empty() {
                break;
            }
            if sweeps < self.drain.spin_limit {
                sweeps += 1;
                std::hint::spin_loop();
            } else {
                thread::yield_now();
            }
        }
        trace!(target: "lrkv::core::refresh", sweeps, "stragglers_drained");
    }

    /// Refresh-on-drop view of this writer.
    ///
    /// Writes performed through the guard are published when it goes out of
    /// scope, mirroring the explicit [`refresh`](Self::refresh).
    pub fn scoped(&mut self) -> ScopedWriter<'_, C, O> {
        ScopedWriter { writer: self }
    }
}

impl<C, O> fmt::Debug for Writer<C, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Writer")
            .field("pending_ops", &self.op_log.len())
            .field("drain", &self.drain)
            .finish_non_exhaustive()
    }
}

/// Exclusive access to the standby copy.
///
/// The publication pointer does not target this copy, and refresh drains
/// every straggler before replaying into it, so the writer is the sole
/// owner outside a refresh window. The spin covers the instants where a
/// just-drained reader's pointer guard is still releasing its reference.
fn standby_mut<C>(standby: &mut Arc<C>) -> &mut C {
    while Arc::get_mut(standby).is_none() {
        std::hint::spin_loop();
    }
    Arc::get_mut(standby).expect("standby copy has a single owner after drain")
}

/// Applies pending writes when the scope ends.
///
/// Mirrors the writer API through `Deref`/`DerefMut`; dropping the guard
/// runs [`Writer::refresh`].
pub struct ScopedWriter<'a, C, O: Operation<C>> {
    writer: &'a mut Writer<C, O>,
}

impl<C, O: Operation<C>> Deref for ScopedWriter<'_, C, O> {
    type Target = Writer<C, O>;

    fn deref(&self) -> &Writer<C, O> {
        self.writer
    }
}

impl<C, O: Operation<C>> DerefMut for ScopedWriter<'_, C, O> {
    fn deref_mut(&mut self) -> &mut Writer<C, O> {
        self.writer
    }
}

impl<C, O: Operation<C>> Drop for ScopedWriter<'_, C, O> {
    fn drop(&mut self) {
        self.writer.refresh();
    }
}

impl<C, O: Operation<C>> fmt::Debug for ScopedWriter<'_, C, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedWriter")
            .field("pending_ops", &self.writer.op_log.len())
            .finish()
    }
}
