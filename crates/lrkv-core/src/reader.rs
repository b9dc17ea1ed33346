//! Read handles and their factory.
//!
//! A [`Reader`] runs closures against the currently published copy inside a
//! wait-free read window: no locks, no compare-and-swap, just two epoch
//! increments around an acquire load of the publication pointer. The window
//! is the exact interval during which a refreshing writer must treat the
//! reader as potentially touching the retired copy.
//!
//! ## Logging
//!
//! - **TRACE** `lrkv::core::read`: `read_window_closed` — a read completed
//! - **DEBUG** `lrkv::core::registry`: `reader_registered` — a reader joined

use crate::Shared;
use crate::epoch::ReadEpoch;
use crate::metrics;
use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

/// A read handle bound to one logical thread.
///
/// `Send` but deliberately not `Sync`: sharing one reader across threads
/// would corrupt its epoch parity. Create one reader per thread through
/// [`ReaderFactory::create_reader`].
pub struct Reader<C> {
    shared: Arc<Shared<C>>,
    epoch: Arc<ReadEpoch>,
    /// Keeps the handle out of `Sync`.
    _single_owner: PhantomData<Cell<()>>,
}

impl<C> Reader<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>, epoch: Arc<ReadEpoch>) -> Self {
        Self {
            shared,
            epoch,
            _single_owner: PhantomData,
        }
    }

    /// Run `read` against the currently published copy and return its
    /// result.
    ///
    /// The closure must not mutate the container, must not stash the borrow
    /// past the call, and must not re-enter this handle (a nested read
    /// panics). If the closure panics, the read window still closes before
    /// the panic propagates, so a later refresh does not wait forever.
    #[inline]
    pub fn perform_read<T>(&self, read: impl FnOnce(&C) -> T) -> T {
        let window = self.epoch.enter();
        let published = self.shared.published.load();
        let out = read(&published);
        drop(published);
        drop(window);
        metrics::record_read();
        trace!(target: "lrkv::core::read", "read_window_closed");
        out
    }
}

impl<C> fmt::Debug for Reader<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("epoch", &self.epoch.observe())
            .finish_non_exhaustive()
    }
}

/// Thread-safe creator and registrar of [`Reader`]s.
///
/// Cloneable and shareable; [`create_reader`](Self::create_reader) may be
/// called from any thread at any time, including concurrently with a
/// refresh. Registered readers stay tracked for the lifetime of the
/// primitive — the registry only grows.
pub struct ReaderFactory<C> {
    shared: Arc<Shared<C>>,
}

impl<C> Clone for ReaderFactory<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C> ReaderFactory<C> {
    pub(crate) fn new(shared: Arc<Shared<C>>) -> Self {
        Self { shared }
    }

    /// Register and return a new reader.
    pub fn create_reader(&self) -> Reader<C> {
        let epoch = Arc::new(ReadEpoch::new());
        let registered = {
            let mut registry = self.shared.registry.lock();
            registry.push(Arc::clone(&epoch));
            registry.len()
        };
        metrics::record_reader_created();
        debug!(target: "lrkv::core::registry", registered, "reader_registered");
        Reader::new(Arc::clone(&self.shared), epoch)
    }
}

impl<C> fmt::Debug for ReaderFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderFactory")
            .field("registered", &self.shared.registry.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Operation, create};
    use std::panic::{AssertUnwindSafe, catch_unwind};

    struct Push(u32);

    impl Operation<Vec<u32>> for Push {
        type Output = ();

        fn apply(&self, target: &mut Vec<u32>) {
            target.push(self.0);
        }
    }

    #[test]
    fn read_returns_closure_result() {
        let (factory, mut writer) = create::<Vec<u32>, Push>(Vec::new);
        let reader = factory.create_reader();
        writer.write(Push(3));
        writer.refresh();
        assert_eq!(reader.perform_read(|v| v.iter().sum::<u32>()), 3);
    }

    #[test]
    fn epoch_is_even_after_panicking_closure() {
        let (factory, mut writer) = create::<Vec<u32>, Push>(Vec::new);
        let reader = factory.create_reader();

        let caught = catch_unwind(AssertUnwindSafe(|| {
            reader.perform_read(|_| panic!("closure failure"));
        }));
        assert!(caught.is_err());

        // A stuck-odd epoch would hang this refresh forever.
        writer.write(Push(1));
        writer.refresh();
        assert_eq!(reader.perform_read(Vec::len), 1);
    }

    #[test]
    #[should_panic(expected = "re-entrant read")]
    fn nested_read_on_one_handle_panics() {
        let (factory, _writer) = create::<Vec<u32>, Push>(Vec::new);
        let reader = factory.create_reader();
        reader.perform_read(|_| reader.perform_read(Vec::len));
    }

    #[test]
    fn factory_clones_share_the_registry() {
        let (factory, mut writer) = create::<Vec<u32>, Push>(Vec::new);
        let cloned = factory.clone();
        let a = factory.create_reader();
        let b = cloned.create_reader();

        writer.write(Push(9));
        writer.refresh();
        assert_eq!(a.perform_read(|v| v.clone()), vec![9]);
        assert_eq!(b.perform_read(|v| v.clone()), vec![9]);
    }
}
