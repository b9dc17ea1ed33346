//! Wait-free read handles for the map.

use crate::handle::ThreadLocalReader;
use lrkv_core::{Reader, ReaderFactory};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

/// A read handle over the published copy of the map.
///
/// Bound to one logical thread, like the underlying [`Reader`]; values are
/// returned by clone so no borrow of the map escapes the read window.
/// Reads observe the state as of the writer's last refresh.
pub struct MapReader<K, V> {
    inner: Reader<HashMap<K, V>>,
}

impl<K, V> MapReader<K, V>
where
    K: Eq + Hash,
    V: Clone + PartialEq,
{
    pub(crate) fn new(inner: Reader<HashMap<K, V>>) -> Self {
        Self { inner }
    }

    /// Value mapped to `key`, if any.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.perform_read(|map| map.get(key).cloned())
    }

    /// Value mapped to `key`, or `default` when absent.
    #[must_use]
    pub fn get_or_default(&self, key: &K, default: V) -> V {
        self.inner
            .perform_read(|map| map.get(key).cloned())
            .unwrap_or(default)
    }

    /// Whether `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.perform_read(|map| map.contains_key(key))
    }

    /// Whether any entry maps to `value`.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner
            .perform_read(|map| map.values().any(|candidate| candidate == value))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.perform_read(HashMap::len)
    }

    /// Whether the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.perform_read(HashMap::is_empty)
    }

    /// Visit every `(key, value)` pair in the observed copy.
    ///
    /// Iteration order is unspecified. The whole traversal happens inside
    /// one read window, so `action` sees a single consistent state.
    pub fn for_each(&self, mut action: impl FnMut(&K, &V)) {
        self.inner.perform_read(|map| {
            for (key, value) in map {
                action(key, value);
            }
        });
    }
}

impl<K, V> fmt::Debug for MapReader<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapReader")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Thread-safe creator of [`MapReader`]s.
pub struct MapReaderFactory<K, V> {
    inner: ReaderFactory<HashMap<K, V>>,
}

impl<K, V> Clone for MapReaderFactory<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V> MapReaderFactory<K, V>
where
    K: Eq + Hash,
    V: Clone + PartialEq,
{
    pub(crate) fn new(inner: ReaderFactory<HashMap<K, V>>) -> Self {
        Self { inner }
    }

    /// Register and return a reader for the calling thread to own.
    #[must_use]
    pub fn create_reader(&self) -> MapReader<K, V> {
        MapReader::new(self.inner.create_reader())
    }

    /// A shareable handle that lazily caches one reader per thread.
    ///
    /// See [`ThreadLocalReader`] for the registry-growth caveat.
    #[must_use]
    pub fn thread_local(&self) -> ThreadLocalReader<K, V>
    where
        K: Send + Sync,
        V: Send + Sync,
    {
        ThreadLocalReader::new(self.clone())
    }
}

impl<K, V> fmt::Debug for MapReaderFactory<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapReaderFactory")
            .field("inner", &self.inner)
            .finish()
    }
}
