//! Map mutations as a closed, replayable sum type.
//!
//! The primitive replays each operation verbatim against both copies of the
//! map, so the variant carries everything the mutation needs and `apply`
//! clones keys and values into the copy it is mutating — neither copy ever
//! aliases the other.

use lrkv_core::Operation;
use std::collections::HashMap;
use std::hash::Hash;

/// One mutation of the key-value map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOp<K, V> {
    /// Insert `(key, value)`, displacing any previous value.
    Put(K, V),
    /// Insert `(key, value)` only when `key` is absent.
    PutIfAbsent(K, V),
    /// Remove `key`.
    Remove(K),
    /// Remove `key` only while it still maps to `value`.
    RemoveIfEqual(K, V),
    /// Remove every entry.
    Clear,
}

/// Result of applying a [`MapOp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapOpResult<V> {
    /// Previous value for `Put` and `Remove`; already-present value for
    /// `PutIfAbsent`.
    Previous(Option<V>),
    /// Whether `RemoveIfEqual` removed the entry.
    Removed(bool),
    /// `Clear` reports nothing.
    Done,
}

impl<K, V> Operation<HashMap<K, V>> for MapOp<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    type Output = MapOpResult<V>;

    fn apply(&self, target: &mut HashMap<K, V>) -> MapOpResult<V> {
        match self {
            Self::Put(key, value) => {
                MapOpResult::Previous(target.insert(key.clone(), value.clone()))
            }
            Self::PutIfAbsent(key, value) => {
                if let Some(existing) = target.get(key) {
                    MapOpResult::Previous(Some(existing.clone()))
                } else {
                    target.insert(key.clone(), value.clone());
                    MapOpResult::Previous(None)
                }
            }
            Self::Remove(key) => MapOpResult::Previous(target.remove(key)),
            Self::RemoveIfEqual(key, value) => {
                let matched = target.get(key) == Some(value);
                if matched {
                    target.remove(key);
                }
                MapOpResult::Removed(matched)
            }
            Self::Clear => {
                target.clear();
                MapOpResult::Done
            }
        }
    }
}
