/*!
 * shareable-sync
 *
 * Thread-safe data structures meant to be handed between independently
 * scheduled workers: an atomic counter, a coarse-locked map, a striped map
 * with scoped key accessors, and a closable blocking queue.
 */

pub mod core;
pub mod monitoring;
pub mod sync;

// Re-exports
pub use crate::core::{Shareable, SyncError, SyncResult, Value};
pub use monitoring::{init_tracing, MapStats, QueueStats};
pub use sync::{
    AtomicCounter, CancelToken, ClosableQueue, LockedMap, MapConfig, ReadAccessor, StripedMap,
    WriteAccessor,
};
