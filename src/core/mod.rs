/*!
 * Core Module
 * Error handling, limits, and the shareability boundary
 */

pub mod errors;
pub mod limits;
pub mod value;

// Re-export for convenience
pub use errors::{SyncError, SyncResult};
pub use value::{Shareable, Value};
