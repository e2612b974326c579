/*!
 * Blocking Queue
 *
 * Closable FIFO queue whose blocking pop can be bounded by a deadline or
 * interrupted from another thread through a `CancelToken`.
 */

mod cancel;
mod closable;

// Re-export public API
pub use cancel::CancelToken;
pub use closable::ClosableQueue;
