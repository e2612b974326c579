/*!
 * Lock Striping Pattern
 * Reduces contention by partitioning the table across independently locked stripes
 */

use crate::core::errors::SyncResult;
use crate::core::limits::{MAP_ENTRY_OVERHEAD_WORDS, WORD_SIZE};
use crate::core::value::{ensure_shareable, Shareable};
use crate::monitoring::MapStats;
use crate::sync::config::MapConfig;
use ahash::RandomState;
use parking_lot::{MappedRwLockReadGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::debug;

type Stripe<K, V> = HashMap<K, V, RandomState>;

/// Shared handle on one entry; the stripe stays read-locked until it drops
pub type ReadAccessor<'a, V> = MappedRwLockReadGuard<'a, V>;

/// Exclusive handle on one key; the stripe stays write-locked until it drops
///
/// The key may be absent: `insert`/`or_insert_with` create the slot and fill
/// it before the lock is released, so no other operation ever sees a
/// half-initialized entry. Stored values are only reachable by shared
/// reference; every write goes through a shareability check first. Never
/// hold an accessor across another operation on the same map.
pub struct WriteAccessor<'a, K, V> {
    stripe: RwLockWriteGuard<'a, Stripe<K, V>>,
    key: K,
}

impl<'a, K, V> WriteAccessor<'a, K, V>
where
    K: Hash + Eq + Clone + Shareable,
    V: Shareable,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn is_occupied(&self) -> bool {
        self.stripe.contains_key(&self.key)
    }

    pub fn get(&self) -> Option<&V> {
        self.stripe.get(&self.key)
    }

    /// Replace the stored value with `f(current)`
    ///
    /// Returns `Ok(None)` when the key is absent. A non-shareable result is
    /// rejected and the current value stays in place.
    pub fn update<F>(&mut self, f: F) -> SyncResult<Option<&V>>
    where
        F: FnOnce(&V) -> V,
    {
        let Some(slot) = self.stripe.get_mut(&self.key) else {
            return Ok(None);
        };
        let next = f(&*slot);
        ensure_shareable("value", &next)?;
        *slot = next;
        Ok(Some(&*slot))
    }

    /// Fill the slot, returning the previous value
    pub fn insert(&mut self, value: V) -> SyncResult<Option<V>> {
        ensure_shareable("key", &self.key)?;
        ensure_shareable("value", &value)?;
        Ok(self.stripe.insert(self.key.clone(), value))
    }

    /// Find-or-create: existing value, or `init()` stored under the key
    ///
    /// `init` only runs for an absent, shareable key.
    pub fn or_insert_with<F>(&mut self, init: F) -> SyncResult<&V>
    where
        F: FnOnce() -> V,
    {
        ensure_shareable("key", &self.key)?;
        let stored: &V = match self.stripe.entry(self.key.clone()) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let value = init();
                ensure_shareable("value", &value)?;
                slot.insert(value)
            }
        };
        Ok(stored)
    }

    /// Find-or-create, then `update` under the same lock
    ///
    /// Only the result of `f` is checked and stored; a fresh `init()` value
    /// is just its input.
    pub fn upsert<I, F>(&mut self, init: I, f: F) -> SyncResult<&V>
    where
        I: FnOnce() -> V,
        F: FnOnce(&V) -> V,
    {
        ensure_shareable("key", &self.key)?;
        let stored: &V = match self.stripe.entry(self.key.clone()) {
            Entry::Occupied(mut slot) => {
                let next = f(slot.get());
                ensure_shareable("value", &next)?;
                slot.insert(next);
                slot.into_mut()
            }
            Entry::Vacant(slot) => {
                let next = f(&init());
                ensure_shareable("value", &next)?;
                slot.insert(next)
            }
        };
        Ok(stored)
    }

    pub fn remove(&mut self) -> Option<V> {
        self.stripe.remove(&self.key)
    }
}

/// Lock-striped hash map for reduced contention
///
/// Point operations lock only the stripe the key hashes to, so workers on
/// distinct keys rarely meet. `size()` and `clear()` lock every stripe in
/// index order and hold them together, which makes them linearizable with
/// respect to point operations; point operations never hold more than one
/// stripe, so the fixed order cannot deadlock.
///
/// # Performance
///
/// - **Contention reduction**: N-way striping reduces lock contention by ~N
/// - **Typical stripe count**: 16-64 (balance between memory and contention)
/// - **Global operations**: O(stripes) lock acquisitions
///
/// # Example
///
/// ```
/// use shareable_sync::{StripedMap, Value};
///
/// let map = StripedMap::new();
/// map.set(Value::symbol("a"), Value::Int(1)).unwrap();
///
/// // Find-or-create and mutate under one exclusive accessor
/// {
///     let mut slot = map.write(Value::symbol("hits"));
///     slot.upsert(|| Value::Int(0), |hits| Value::Int(hits.as_int().unwrap_or(0) + 1))
///         .unwrap();
/// }
///
/// assert_eq!(*map.read(&Value::symbol("hits")).unwrap(), Value::Int(1));
/// ```
pub struct StripedMap<K, V> {
    stripes: Vec<RwLock<Stripe<K, V>>>,
    stripe_mask: usize,
}

impl<K, V> StripedMap<K, V>
where
    K: Hash + Eq + Clone + Shareable,
    V: Clone + Shareable,
{
    /// Create with the default configuration
    pub fn new() -> Self {
        Self::build(MapConfig::default())
    }

    /// Create with a validated configuration
    pub fn with_config(config: MapConfig) -> SyncResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    /// Create with `stripe_count` stripes (power of 2)
    pub fn with_stripes(stripe_count: usize) -> SyncResult<Self> {
        Self::with_config(MapConfig::default().with_stripes(stripe_count))
    }

    fn build(config: MapConfig) -> Self {
        let per_stripe = config.capacity_per_stripe();
        let stripes = (0..config.stripe_count)
            .map(|_| RwLock::new(HashMap::with_capacity_and_hasher(per_stripe, RandomState::new())))
            .collect();

        Self {
            stripes,
            stripe_mask: config.stripe_count - 1,
        }
    }

    /// Get stripe index for key (uses hash)
    #[inline]
    fn stripe_index<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        let mut hasher = ahash::AHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) & self.stripe_mask
    }

    /// Shared accessor for `key`, or `None` if absent
    pub fn read<Q>(&self, key: &Q) -> Option<ReadAccessor<'_, V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.stripe_index(key);
        RwLockReadGuard::try_map(self.stripes[idx].read(), |stripe| stripe.get(key)).ok()
    }

    /// Exclusive accessor for `key`, present or not
    pub fn write(&self, key: K) -> WriteAccessor<'_, K, V> {
        let idx = self.stripe_index(&key);
        WriteAccessor {
            stripe: self.stripes[idx].write(),
            key,
        }
    }

    /// Value stored under `key`, if any
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.read(key).map(|value| V::clone(&value))
    }

    /// Insert or overwrite, returning the stored value
    ///
    /// Shareability is checked before the stripe is locked; on failure the
    /// map is left untouched.
    pub fn set(&self, key: K, value: V) -> SyncResult<V> {
        ensure_shareable("key", &key)?;
        ensure_shareable("value", &value)?;

        // Slot is created and filled under the one write guard
        let mut slot = self.write(key);
        let key = slot.key.clone();
        slot.stripe.insert(key, value.clone());
        Ok(value)
    }

    /// Remove `key`, returning its value; a missing key is not an error
    pub fn delete<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.stripe_index(key);
        self.stripes[idx].write().remove(key)
    }

    /// Check if key exists
    pub fn has_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.stripe_index(key);
        self.stripes[idx].read().contains_key(key)
    }

    /// Total entries; a consistent snapshot across all stripes
    pub fn size(&self) -> usize {
        let stripes = self.read_all();
        stripes.iter().map(|stripe| stripe.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drop every entry in one step relative to point operations
    pub fn clear(&self) {
        let mut stripes: Vec<_> = self.stripes.iter().map(|stripe| stripe.write()).collect();
        let mut dropped = 0;
        for stripe in stripes.iter_mut() {
            dropped += stripe.len();
            stripe.clear();
        }
        debug!(dropped, stripes = self.stripes.len(), "striped map cleared");
    }

    /// Visit every key and value, one stripe lock at a time
    ///
    /// Collector hook: `f` must not call back into this map.
    pub fn trace<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for stripe in &self.stripes {
            let guard = stripe.read();
            for (k, v) in guard.iter() {
                f(k, v);
            }
        }
    }

    /// Number of stripes
    pub fn stripe_count(&self) -> usize {
        self.stripes.len()
    }

    /// Snapshot of entry distribution
    pub fn stats(&self) -> MapStats {
        let stripes = self.read_all();
        MapStats {
            entries: stripes.iter().map(|stripe| stripe.len()).sum(),
            stripes: stripes.len(),
            largest_stripe: stripes.iter().map(|stripe| stripe.len()).max().unwrap_or(0),
        }
    }

    /// Approximate memory footprint in bytes
    pub fn memsize(&self) -> usize {
        let entry = std::mem::size_of::<K>()
            + std::mem::size_of::<V>()
            + MAP_ENTRY_OVERHEAD_WORDS * WORD_SIZE;
        std::mem::size_of::<Self>()
            + self.stripes.len() * std::mem::size_of::<RwLock<Stripe<K, V>>>()
            + self.size() * entry
    }

    /// Read-lock every stripe in index order
    fn read_all(&self) -> Vec<RwLockReadGuard<'_, Stripe<K, V>>> {
        self.stripes.iter().map(|stripe| stripe.read()).collect()
    }
}

impl<K, V> Default for StripedMap<K, V>
where
    K: Hash + Eq + Clone + Shareable,
    V: Clone + Shareable,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for StripedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StripedMap")
            .field("stripes", &self.stripes.len())
            .finish()
    }
}

impl<K, V> Shareable for StripedMap<K, V> {
    fn is_shareable(&self) -> bool {
        true
    }
}
