/*!
 * Atomic Counter
 * Linearizable 64-bit integer cell shared by reference across threads
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::value::Shareable;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing::debug;

/// Atomic signed 64-bit counter
///
/// Every operation is a single atomic instruction with sequentially
/// consistent ordering, so all holders agree on one total order of updates.
/// Arithmetic wraps on overflow, matching the hardware `fetch_add`.
///
/// # Performance
///
/// - Cache-line aligned to prevent false sharing with neighbouring counters
/// - Never blocks
///
/// # Example
///
/// ```
/// use shareable_sync::AtomicCounter;
///
/// let counter = AtomicCounter::new(5);
/// assert_eq!(counter.increment(), 6);
/// assert!(counter.compare_and_set(6, 10));
/// assert!(!counter.compare_and_set(6, 20));
/// assert_eq!(counter.get(), 10);
/// ```
#[repr(C, align(64))]
pub struct AtomicCounter {
    value: AtomicI64,
}

/// Convert a foreign integer into the counter's width
fn to_i64<T>(value: T) -> SyncResult<i64>
where
    T: TryInto<i64> + Copy + fmt::Display,
{
    value.try_into().map_err(|_| {
        debug!(%value, "integer does not fit in counter width");
        SyncError::invalid(format!("{} does not fit in a 64-bit counter", value))
    })
}

impl AtomicCounter {
    /// Create a counter holding `initial`
    pub const fn new(initial: i64) -> Self {
        Self {
            value: AtomicI64::new(initial),
        }
    }

    /// Create a counter from any integer type, rejecting values outside `i64`
    pub fn try_new<T>(initial: T) -> SyncResult<Self>
    where
        T: TryInto<i64> + Copy + fmt::Display,
    {
        Ok(Self::new(to_i64(initial)?))
    }

    /// Current value
    #[inline(always)]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::SeqCst)
    }

    /// Overwrite the value
    #[inline(always)]
    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::SeqCst);
    }

    /// Overwrite the value from any integer type
    pub fn try_set<T>(&self, value: T) -> SyncResult<()>
    where
        T: TryInto<i64> + Copy + fmt::Display,
    {
        self.set(to_i64(value)?);
        Ok(())
    }

    /// Add one and return the new value
    #[inline(always)]
    pub fn increment(&self) -> i64 {
        self.add(1)
    }

    /// Subtract one and return the new value
    #[inline(always)]
    pub fn decrement(&self) -> i64 {
        self.subtract(1)
    }

    /// Add `delta` and return the new value
    #[inline(always)]
    pub fn add(&self, delta: i64) -> i64 {
        self.value.fetch_add(delta, Ordering::SeqCst).wrapping_add(delta)
    }

    /// Subtract `delta` and return the new value
    #[inline(always)]
    pub fn subtract(&self, delta: i64) -> i64 {
        self.value.fetch_sub(delta, Ordering::SeqCst).wrapping_sub(delta)
    }

    /// `add` for deltas of any integer type
    pub fn try_add<T>(&self, delta: T) -> SyncResult<i64>
    where
        T: TryInto<i64> + Copy + fmt::Display,
    {
        Ok(self.add(to_i64(delta)?))
    }

    /// `subtract` for deltas of any integer type
    pub fn try_subtract<T>(&self, delta: T) -> SyncResult<i64>
    where
        T: TryInto<i64> + Copy + fmt::Display,
    {
        Ok(self.subtract(to_i64(delta)?))
    }

    /// Store `new` iff the current value equals `expected`
    ///
    /// Single attempt: returns `false` and leaves the value untouched on a
    /// mismatch. Callers wanting a retry loop build it on top.
    #[inline]
    pub fn compare_and_set(&self, expected: i64, new: i64) -> bool {
        self.value
            .compare_exchange(expected, new, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Approximate memory footprint in bytes
    pub fn memsize(&self) -> usize {
        std::mem::size_of::<Self>()
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new(0)
    }
}

impl From<i64> for AtomicCounter {
    fn from(initial: i64) -> Self {
        Self::new(initial)
    }
}

impl fmt::Debug for AtomicCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicCounter")
            .field("value", &self.get())
            .finish()
    }
}

impl Shareable for AtomicCounter {
    fn is_shareable(&self) -> bool {
        true
    }
}
