/*!
 * Lock-Based Maps
 *
 * Two hash maps with the same contract and different lock granularity:
 * - Coarse (one mutex for the whole table, simplest and fully linearizable)
 * - Striped (per-stripe read/write locks with scoped key accessors)
 */

mod locked;
mod striped;

// Re-export public API
pub use locked::LockedMap;
pub use striped::{ReadAccessor, StripedMap, WriteAccessor};
