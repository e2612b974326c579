/*!
 * Statistics Snapshots
 * Serializable point-in-time views of the shared structures
 */

use serde::{Deserialize, Serialize};

/// Queue snapshot taken under the queue lock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    pub length: usize,
    pub closed: bool,
    /// Poppers blocked at the time of the snapshot
    pub waiters: usize,
}

/// Striped map snapshot taken with every stripe read-locked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapStats {
    pub entries: usize,
    pub stripes: usize,
    /// Entries in the fullest stripe; far above `entries / stripes` means a skewed hash
    pub largest_stripe: usize,
}

impl MapStats {
    /// Mean entries per stripe
    pub fn load_factor(&self) -> f64 {
        if self.stripes == 0 {
            0.0
        } else {
            self.entries as f64 / self.stripes as f64
        }
    }
}
