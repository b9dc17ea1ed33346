#![forbid(unsafe_code)]
//! Left-right concurrency primitive: wait-free reads, single-writer publish.
//!
//! Two copies of a caller-supplied container are maintained. Readers access
//! the *published* copy through a short, wait-free read window; the single
//! [`Writer`] mutates the *standby* copy and appends every operation to a
//! log. [`Writer::refresh`] swaps the publication pointer, waits for readers
//! that were still inside the retired copy, then replays the log against it
//! so both copies converge.
//!
//! ## Protocol
//!
//! **Reader** ([`Reader::perform_read`]):
//!   1. Increment the reader's epoch counter (now odd: inside a read).
//!   2. Acquire-load the publication pointer.
//!   3. Run the read closure against that copy.
//!   4. Increment the epoch again (even: outside), including on unwind.
//!
//! **Writer** ([`Writer::refresh`]):
//!   1. Under the registry lock, swap the standby copy into the publication
//!      pointer and snapshot every reader whose epoch is odd (a *straggler*
//!      that may still be touching the retired copy).
//!   2. Wait for each straggler's epoch to change — any change means it has
//!      left the read it was in, and a new read targets the new copy.
//!   3. Replay the operation log in order against the retired copy; clear it.
//!
//! Reads never take locks and never spin. The writer never blocks readers;
//! only `refresh` waits, and only for readers that were mid-read at the
//! moment of publication.
//!
//! ## Logging
//!
//! - **TRACE** `lrkv::core::read`: `read_window_closed` — a read completed
//! - **DEBUG** `lrkv::core::registry`: `reader_registered` — a reader joined
//! - **DEBUG** `lrkv::core::refresh`: `refresh_complete` — straggler and
//!   replay counts for a finished refresh
//! - **TRACE** `lrkv::core::refresh`: `stragglers_drained` — drain loop wait
//!
//! ## Example
//!
//! ```
//! use lrkv_core::{Operation, create};
//!
//! struct Append(u64);
//!
//! impl Operation<Vec<u64>> for Append {
//!     type Output = usize;
//!
//!     fn apply(&self, target: &mut Vec<u64>) -> usize {
//!         target.push(self.0);
//!         target.len()
//!     }
//! }
//!
//! let (factory, mut writer) = create::<Vec<u64>, Append>(Vec::new);
//! let reader = factory.create_reader();
//!
//! writer.write(Append(7));
//! assert_eq!(reader.perform_read(Vec::len), 0); // not yet published
//!
//! writer.refresh();
//! assert_eq!(reader.perform_read(Vec::len), 1);
//! ```

mod epoch;
mod metrics;
mod op;
mod reader;
mod writer;

pub use metrics::{LeftRightMetrics, leftright_metrics, reset_leftright_metrics};
pub use op::Operation;
pub use reader::{Reader, ReaderFactory};
pub use writer::{DrainPolicy, ScopedWriter, Writer};

use arc_swap::ArcSwap;
use epoch::ReadEpoch;
use parking_lot::Mutex;
use std::sync::Arc;

/// State shared between the reader side and the writer.
///
/// The publication pointer is the only always-shared mutable cell; the
/// registry is touched under its mutex by [`ReaderFactory::create_reader`]
/// and by the snapshot step of [`Writer::refresh`].
pub(crate) struct Shared<C> {
    /// The copy readers currently target.
    pub(crate) published: ArcSwap<C>,
    /// Epoch slot of every reader ever registered. Append-only for the
    /// lifetime of the primitive.
    pub(crate) registry: Mutex<Vec<Arc<ReadEpoch>>>,
}

/// Create a left-right pair over containers produced by `make`.
///
/// `make` is invoked exactly twice, once per copy; both invocations must
/// yield the same initial state (usually empty). The [`ReaderFactory`] may
/// be cloned and used from any thread; the [`Writer`] is the single
/// mutating handle and is handed out exactly once.
pub fn create<C, O: Operation<C>>(make: impl FnMut() -> C) -> (ReaderFactory<C>, Writer<C, O>) {
    create_with(make, DrainPolicy::default())
}

/// Like [`create`], with an explicit straggler-drain policy.
pub fn create_with<C, O: Operation<C>>(
    mut make: impl FnMut() -> C,
    drain: DrainPolicy,
) -> (ReaderFactory<C>, Writer<C, O>) {
    let shared = Arc::new(Shared {
        published: ArcSwap::from_pointee(make()),
        registry: Mutex::new(Vec::new()),
    });
    let standby = Arc::new(make());
    let factory = ReaderFactory::new(Arc::clone(&shared));
    let writer = Writer::new(shared, standby, drain);
    (factory, writer)
}
