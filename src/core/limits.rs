/*!
 * Limits and Constants
 *
 * Centralized location for the sizing constants used by the shared structures.
 * Performance-critical constants are marked with [PERF].
 */

// =============================================================================
// STRIPED MAP
// =============================================================================

/// Default stripe count for `StripedMap`
/// [PERF] 16 stripes cut contention roughly 16-way at a small memory cost
pub const DEFAULT_STRIPE_COUNT: usize = 16;

/// Stripe count for maps shared by few workers
pub const LOW_CONTENTION_STRIPES: usize = 4;

/// Stripe count for maps hammered by many workers
/// [PERF] Beyond 64 stripes the global operations (size/clear) dominate
pub const HIGH_CONTENTION_STRIPES: usize = 64;

/// Upper bound on stripes; keeps `size()`/`clear()` lock sweeps bounded
pub const MAX_STRIPE_COUNT: usize = 1024;

// =============================================================================
// MEMORY ESTIMATES
// =============================================================================

/// Per-entry bookkeeping overhead of a hash table bucket (in pointer-sized words)
/// Matches the estimate the host runtime expects from `memsize`
pub const MAP_ENTRY_OVERHEAD_WORDS: usize = 4;

/// Word size used by the memory estimates
pub const WORD_SIZE: usize = std::mem::size_of::<usize>();
