/*!
 * Shared Data Structures
 *
 * Four independent primitives, each safe to share by reference across
 * threads without external locking:
 * - Atomic counter (single-word read/write/CAS/add)
 * - Coarse-locked map (one mutex for the whole table)
 * - Striped map (per-stripe locks, scoped key accessors)
 * - Closable blocking queue (FIFO with blocking pop and permanent close)
 *
 * # Shareability
 *
 * Every operation that stores a caller-supplied value checks
 * `Shareable::is_shareable` first and fails with `InvalidArgument` before
 * touching the structure.
 */

mod atomic;
mod config;
pub mod locks;
pub mod queue;

pub use atomic::AtomicCounter;
pub use config::MapConfig;
pub use locks::{LockedMap, ReadAccessor, StripedMap, WriteAccessor};
pub use queue::{CancelToken, ClosableQueue};
