/*!
 * Coarse-Locked Map
 * One mutex guarding the whole hash table
 */

use crate::core::errors::SyncResult;
use crate::core::limits::{MAP_ENTRY_OVERHEAD_WORDS, WORD_SIZE};
use crate::core::value::{ensure_shareable, Shareable};
use ahash::RandomState;
use parking_lot::Mutex;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use tracing::debug;

/// Hash map behind a single mutex
///
/// Readers and writers share the same lock: every operation is linearizable
/// against every other, at the price of no read concurrency. Use
/// `StripedMap` when many workers touch distinct keys.
///
/// # Example
///
/// ```
/// use shareable_sync::{LockedMap, Value};
///
/// let map = LockedMap::new();
/// map.set(Value::symbol("foo"), Value::symbol("bar")).unwrap();
/// assert_eq!(map.get(&Value::symbol("foo")), Some(Value::symbol("bar")));
///
/// // Mutable strings are rejected before the lock is taken
/// assert!(map.set(Value::symbol("k"), Value::string("mutable")).is_err());
/// ```
pub struct LockedMap<K, V> {
    table: Mutex<HashMap<K, V, RandomState>>,
}

impl<K, V> LockedMap<K, V>
where
    K: Hash + Eq + Shareable,
    V: Clone + Shareable,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: Mutex::new(HashMap::with_capacity_and_hasher(
                capacity,
                RandomState::new(),
            )),
        }
    }

    /// Value stored under `key`, if any
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.lock().get(key).cloned()
    }

    /// Insert or overwrite, returning the stored value
    ///
    /// Fails with `InvalidArgument` if the key or value is not shareable;
    /// the check runs before the lock is taken and the map is left untouched.
    pub fn set(&self, key: K, value: V) -> SyncResult<V> {
        ensure_shareable("key", &key)?;
        ensure_shareable("value", &value)?;

        self.table.lock().insert(key, value.clone());
        Ok(value)
    }

    /// Remove `key`, returning its value; a missing key is not an error
    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.lock().remove(key)
    }

    pub fn has_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.lock().contains_key(key)
    }

    pub fn size(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Drop every entry in one critical section
    pub fn clear(&self) {
        let mut table = self.table.lock();
        let dropped = table.len();
        table.clear();
        debug!(dropped, "locked map cleared");
    }

    /// Visit every key and value while the lock is held
    ///
    /// Collector hook: `f` must not call back into this map.
    pub fn trace<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        let table = self.table.lock();
        for (key, value) in table.iter() {
            f(key, value);
        }
    }

    /// Approximate memory footprint in bytes
    pub fn memsize(&self) -> usize {
        let entry = std::mem::size_of::<K>()
            + std::mem::size_of::<V>()
            + MAP_ENTRY_OVERHEAD_WORDS * WORD_SIZE;
        std::mem::size_of::<Self>() + self.size() * entry
    }
}

impl<K, V> Default for LockedMap<K, V>
where
    K: Hash + Eq + Shareable,
    V: Clone + Shareable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for LockedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockedMap")
            .field("len", &self.table.lock().len())
            .finish()
    }
}

impl<K, V> Shareable for LockedMap<K, V> {
    fn is_shareable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::SyncError;
    use crate::core::value::Value;
    use std::sync::Arc;
    use std::thread;

    fn sym(name: &str) -> Value {
        Value::symbol(name)
    }

    #[test]
    fn test_basic_operations() {
        let map = LockedMap::new();
        assert_eq!(map.get(&sym("foo")), None);

        assert_eq!(map.set(sym("foo"), sym("bar")).unwrap(), sym("bar"));
        assert_eq!(map.get(&sym("foo")), Some(sym("bar")));
        assert_eq!(map.size(), 1);
        assert!(map.has_key(&sym("foo")));

        assert_eq!(map.delete(&sym("foo")), Some(sym("bar")));
        assert_eq!(map.get(&sym("foo")), None);
        assert_eq!(map.delete(&sym("foo")), None);
        assert!(map.is_empty());
    }

    #[test]
    fn test_clear() {
        let map = LockedMap::new();
        map.set(sym("a"), Value::Int(1)).unwrap();
        map.set(sym("b"), Value::Int(2)).unwrap();

        assert_eq!(map.size(), 2);
        map.clear();
        assert_eq!(map.size(), 0);
        assert_eq!(map.get(&sym("a")), None);
    }

    #[test]
    fn test_rejects_non_shareable() {
        let map = LockedMap::new();

        let err = map.set(Value::string("mutable"), Value::Int(42)).unwrap_err();
        assert_eq!(err, SyncError::invalid("key must be shareable"));

        let err = map.set(sym("key"), Value::string("mutable")).unwrap_err();
        assert_eq!(err, SyncError::invalid("value must be shareable"));

        assert!(map.is_empty());
    }

    #[test]
    fn test_content_equal_keys_overwrite() {
        let map = LockedMap::new();
        map.set(Value::frozen_str("test"), Value::Int(1)).unwrap();
        map.set(Value::frozen_str("test"), Value::Int(2)).unwrap();

        assert_eq!(map.get(&Value::frozen_str("test")), Some(Value::Int(2)));
        assert_eq!(map.size(), 1);
    }

    #[test]
    fn test_borrowed_lookup() {
        let map: LockedMap<String, i64> = LockedMap::new();
        map.set("answer".to_string(), 42).unwrap();
        assert_eq!(map.get("answer"), Some(42));
        assert!(map.has_key("answer"));
        assert_eq!(map.delete("answer"), Some(42));
    }

    #[test]
    fn test_trace_visits_everything() {
        let map = LockedMap::new();
        for i in 0..10 {
            map.set(Value::Int(i), Value::Int(i * 2)).unwrap();
        }

        let mut marked = 0;
        map.trace(|key, value| {
            assert_eq!(value.as_int(), key.as_int().map(|k| k * 2));
            marked += 1;
        });
        assert_eq!(marked, 10);
    }

    #[test]
    fn test_memsize_grows() {
        let map = LockedMap::new();
        let empty = map.memsize();
        map.set(Value::Int(1), Value::Int(1)).unwrap();
        assert!(map.memsize() > empty);
    }

    #[test]
    fn test_concurrent_writers() {
        let map = Arc::new(LockedMap::new());

        let handles: Vec<_> = (0..10)
            .map(|t| {
                let map = map.clone();
                thread::spawn(move || {
                    for j in 0..100 {
                        map.set(Value::Int(t * 1000 + j), Value::Int(j)).unwrap();
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(map.size(), 1000);
    }
}
