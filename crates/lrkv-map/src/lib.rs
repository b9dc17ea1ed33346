#![forbid(unsafe_code)]
//! Read-optimized key-value map over the left-right primitive.
//!
//! A thin façade that packages map mutations as replayable operations for
//! [`lrkv_core`] and forwards read-shaped queries to the reader or writer
//! side. Reads are wait-free; writes are serialized through the single
//! [`MapWriter`] and become visible only at [`MapWriter::refresh`] (or when
//! a [`ScopedMapWriter`] ends). Between refreshes readers observe the last
//! published state — never a partially-applied batch.
//!
//! ## Handles
//!
//! - [`MapWriter`] — the one mutating handle; its own reads always see its
//!   own writes.
//! - [`MapReader`] — a wait-free read handle bound to one thread.
//! - [`MapReaderFactory`] — thread-safe source of readers.
//! - [`ThreadLocalReader`] — shareable handle caching one reader per
//!   calling thread.
//!
//! ## Example
//!
//! ```
//! let (readers, mut writer) = lrkv_map::create::<String, String>();
//! let reader = readers.create_reader();
//!
//! writer.put("a".to_string(), "b".to_string());
//! assert_eq!(reader.get(&"a".to_string()), None); // not yet published
//!
//! writer.refresh();
//! assert_eq!(reader.get(&"a".to_string()), Some("b".to_string()));
//! ```

mod handle;
mod op;
mod read;
mod write;

pub use handle::ThreadLocalReader;
pub use op::{MapOp, MapOpResult};
pub use read::{MapReader, MapReaderFactory};
pub use write::{MapWriter, ScopedMapWriter};

use std::collections::HashMap;
use std::hash::Hash;

/// Create an empty map, returning its reader factory and single writer.
///
/// Keys and values are cloned into both copies of the map, so both type
/// parameters require `Clone`; `V: PartialEq` backs `contains_value` and
/// `remove_if_equal`.
#[must_use]
pub fn create<K, V>() -> (MapReaderFactory<K, V>, MapWriter<K, V>)
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    create_with(lrkv_core::DrainPolicy::default())
}

/// Like [`create`], with an explicit straggler-drain policy for the
/// writer's refresh.
#[must_use]
pub fn create_with<K, V>(
    drain: lrkv_core::DrainPolicy,
) -> (MapReaderFactory<K, V>, MapWriter<K, V>)
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    let (factory, writer) =
        lrkv_core::create_with::<HashMap<K, V>, MapOp<K, V>>(HashMap::new, drain);
    (MapReaderFactory::new(factory), MapWriter::new(writer))
}
