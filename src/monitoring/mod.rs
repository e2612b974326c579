/*!
 * Monitoring
 * Tracing setup and stats snapshots
 */

mod stats;
mod tracer;

pub use stats::{MapStats, QueueStats};
pub use tracer::{init_tracing, TRACE_JSON_ENV};
