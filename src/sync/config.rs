/*!
 * Map Configuration
 *
 * Runtime configuration for striped map layout
 */

use crate::core::errors::{SyncError, SyncResult};
use crate::core::limits::{
    DEFAULT_STRIPE_COUNT, HIGH_CONTENTION_STRIPES, LOW_CONTENTION_STRIPES, MAX_STRIPE_COUNT,
};

/// Striped map configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapConfig {
    /// Number of independently locked stripes (power of 2)
    pub stripe_count: usize,
    /// Capacity reserved up front, spread evenly across stripes
    pub initial_capacity: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            stripe_count: DEFAULT_STRIPE_COUNT,
            initial_capacity: 0,
        }
    }
}

impl MapConfig {
    /// Configuration for maps touched by a handful of workers
    pub const fn low_contention() -> Self {
        Self {
            stripe_count: LOW_CONTENTION_STRIPES,
            initial_capacity: 0,
        }
    }

    /// Configuration for maps hammered by many workers on distinct keys
    pub const fn high_contention() -> Self {
        Self {
            stripe_count: HIGH_CONTENTION_STRIPES,
            initial_capacity: 0,
        }
    }

    pub const fn with_stripes(mut self, stripe_count: usize) -> Self {
        self.stripe_count = stripe_count;
        self
    }

    pub const fn with_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Check the stripe count is a power of 2 within bounds
    pub fn validate(&self) -> SyncResult<()> {
        if self.stripe_count == 0 || !self.stripe_count.is_power_of_two() {
            return Err(SyncError::invalid(format!(
                "stripe count must be a power of 2, got {}",
                self.stripe_count
            )));
        }
        if self.stripe_count > MAX_STRIPE_COUNT {
            return Err(SyncError::invalid(format!(
                "stripe count {} exceeds limit {}",
                self.stripe_count, MAX_STRIPE_COUNT
            )));
        }
        Ok(())
    }

    /// Capacity reserved in each stripe
    pub(crate) fn capacity_per_stripe(&self) -> usize {
        self.initial_capacity.div_ceil(self.stripe_count.max(1))
    }
}
