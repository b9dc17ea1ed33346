//! The map's single writer.
//!
//! ## Logging
//!
//! - **TRACE** `lrkv::map`: one event per enqueued mutation

use crate::op::{MapOp, MapOpResult};
use lrkv_core::Writer;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};
use tracing::trace;

/// The single mutating handle over the map.
///
/// Writes land on the write-side copy immediately and become visible to
/// readers at the next [`refresh`](Self::refresh) (or when a
/// [`ScopedMapWriter`] ends). Reads through the writer always observe its
/// own writes, refreshed or not.
pub struct MapWriter<K, V> {
    inner: Writer<HashMap<K, V>, MapOp<K, V>>,
}

impl<K, V> MapWriter<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    pub(crate) fn new(inner: Writer<HashMap<K, V>, MapOp<K, V>>) -> Self {
        Self { inner }
    }

    /// Insert `(key, value)`, returning the previous value for `key`.
    pub fn put(&mut self, key: K, value: V) -> Option<V> {
        trace!(target: "lrkv::map", "put");
        match self.inner.write(MapOp::Put(key, value)) {
            MapOpResult::Previous(previous) => previous,
            MapOpResult::Removed(_) | MapOpResult::Done => {
                unreachable!("put reports a previous value")
            }
        }
    }

    /// Insert `(key, value)` only when `key` is absent; returns the value
    /// already present, if any.
    pub fn put_if_absent(&mut self, key: K, value: V) -> Option<V> {
        trace!(target: "lrkv::map", "put_if_absent");
        match self.inner.write(MapOp::PutIfAbsent(key, value)) {
            MapOpResult::Previous(existing) => existing,
            MapOpResult::Removed(_) | MapOpResult::Done => {
                unreachable!("put_if_absent reports an existing value")
            }
        }
    }

    /// Remove `key`, returning the value it mapped to.
    pub fn remove(&mut self, key: K) -> Option<V> {
        trace!(target: "lrkv::map", "remove");
        match self.inner.write(MapOp::Remove(key)) {
            MapOpResult::Previous(previous) => previous,
            MapOpResult::Removed(_) | MapOpResult::Done => {
                unreachable!("remove reports a previous value")
            }
        }
    }

    /// Remove `key` only while it still maps to `value`; returns whether
    /// the entry was removed.
    pub fn remove_if_equal(&mut self, key: K, value: V) -> bool {
        trace!(target: "lrkv::map", "remove_if_equal");
        match self.inner.write(MapOp::RemoveIfEqual(key, value)) {
            MapOpResult::Removed(removed) => removed,
            MapOpResult::Previous(_) | MapOpResult::Done => {
                unreachable!("remove_if_equal reports a removal flag")
            }
        }
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        trace!(target: "lrkv::map", "clear");
        self.inner.write(MapOp::Clear);
    }

    /// Value mapped to `key` in the write-side copy.
    #[must_use]
    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.read(|map| map.get(key).cloned())
    }

    /// Value mapped to `key`, or `default` when absent.
    #[must_use]
    pub fn get_or_default(&self, key: &K, default: V) -> V {
        self.inner
            .read(|map| map.get(key).cloned())
            .unwrap_or(default)
    }

    /// Whether `key` is present in the write-side copy.
    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.inner.read(|map| map.contains_key(key))
    }

    /// Whether any entry maps to `value` in the write-side copy.
    #[must_use]
    pub fn contains_value(&self, value: &V) -> bool {
        self.inner
            .read(|map| map.values().any(|candidate| candidate == value))
    }

    /// Number of entries in the write-side copy.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read(HashMap::len)
    }

    /// Whether the write-side copy has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read(HashMap::is_empty)
    }

    /// Visit every `(key, value)` pair in the write-side copy.
    pub fn for_each(&self, mut action: impl FnMut(&K, &V)) {
        self.inner.read(|map| {
            for (key, value) in map {
                action(key, value);
            }
        });
    }

    /// Number of mutations awaiting publication.
    #[must_use]
    pub fn pending_ops(&self) -> usize {
        self.inner.pending_ops()
    }

    /// Publish all pending mutations to readers.
    pub fn refresh(&mut self) {
        self.inner.refresh();
    }

    /// Refresh-on-drop view of this writer.
    ///
    /// ```
    /// let (readers, mut writer) = lrkv_map::create::<u32, u32>();
    /// let reader = readers.create_reader();
    /// {
    ///     let mut writer = writer.scoped();
    ///     writer.put(1, 10);
    ///     assert_eq!(reader.get(&1), None); // not yet published
    /// }
    /// assert_eq!(reader.get(&1), Some(10));
    /// ```
    pub fn scoped(&mut self) -> ScopedMapWriter<'_, K, V> {
        ScopedMapWriter { writer: self }
    }
}

impl<K, V> fmt::Debug for MapWriter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapWriter")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Publishes pending mutations when the scope ends.
pub struct ScopedMapWriter<'a, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    writer: &'a mut MapWriter<K, V>,
}

impl<K, V> Deref for ScopedMapWriter<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    type Target = MapWriter<K, V>;

    fn deref(&self) -> &MapWriter<K, V> {
        self.writer
    }
}

impl<K, V> DerefMut for ScopedMapWriter<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn deref_mut(&mut self) -> &mut MapWriter<K, V> {
        self.writer
    }
}

impl<K, V> Drop for ScopedMapWriter<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn drop(&mut self) {
        self.writer.refresh();
    }
}

impl<K, V> fmt::Debug for ScopedMapWriter<'_, K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedMapWriter")
            .field("pending_ops", &self.writer.pending_ops())
            .finish()
    }
}
