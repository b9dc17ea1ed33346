//! Per-thread cached readers.
//!
//! [`ThreadLocalReader`] is a shareable read handle: the first read on each
//! thread registers a dedicated [`MapReader`] and caches it for that
//! thread, so callers can hand one handle to a thread pool without wiring
//! readers through explicitly.
//!
//! The cost is that the reader registry grows with the historical thread
//! population and registered readers are never dropped while the primitive
//! lives. Workloads whose thread identities churn should hold explicit
//! readers from [`MapReaderFactory`] instead.

use crate::read::{MapReader, MapReaderFactory};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use thread_local::ThreadLocal;

/// A `Send + Sync` read handle backed by one lazily-created [`MapReader`]
/// per calling thread.
///
/// Clones share the same per-thread cache.
pub struct ThreadLocalReader<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    factory: MapReaderFactory<K, V>,
    local: Arc<ThreadLocal<MapReader<K, V>>>,
}

impl<K, V> Clone for ThreadLocalReader<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            local: Arc::clone(&self.local),
        }
    }
}

impl<K, V> ThreadLocalReader<K, V>
where
    K: Eq + Hash + Send + Sync,
    V: Clone + PartialEq + Send + Sync,
{
    pub(crate) fn new(factory: MapReaderFactory<K, V>) -> Self {
        Self {
            factory,
            local: Arc::new(ThreadLocal::new()),
        }
    }

    /// The calling thread's reader, registering one on first use.
    fn local(&self) -> &MapReader<K, V> {
        self.local.get_or(|| self.factory.create_reader())
    }

    /// Value mapped to `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.local().get(key)
    }

    /// Value mapped to `key`, or `default` when absent.
    #[must_use]
    pub fn get_or_default(&self, key: &K, default: V) -> V {
        self.local().get_or_default(key, default)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.local().contains_key(key)
    }

    /// Whether any entry maps to `value`.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.local().contains_value(value)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.local().len()
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.local().is_empty()
    }

    /// Visit every `(key, value)` pair in one consistent read window.
    pub fn for_each(&self, action: impl FnMut(&K, &V)) {
        self.local().for_each(action);
    }
}

impl<K, V> fmt::Debug for ThreadLocalReader<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLocalReader")
            .field("factory", &self.factory)
            .finish_non_exhaustive()
    }
}
