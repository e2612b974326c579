/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for every fallible operation in the crate
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors surfaced by the shared data structures
///
/// Every error is raised before the offending operation mutates anything.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum SyncError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(sync::invalid_argument),
        help("Values stored in shared structures must be shareable and numeric inputs must fit in 64 bits.")
    )]
    InvalidArgument(String),

    #[error("Queue is closed")]
    #[diagnostic(
        code(sync::queue_closed),
        help("The queue was closed and no longer accepts items. Pending items can still be popped.")
    )]
    QueueClosed,
}

impl SyncError {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid(msg: impl Into<String>) -> Self {
        SyncError::InvalidArgument(msg.into())
    }

    /// Whether this error came from a closed queue
    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self, SyncError::QueueClosed)
    }
}

impl From<std::num::TryFromIntError> for SyncError {
    fn from(err: std::num::TryFromIntError) -> Self {
        SyncError::InvalidArgument(format!("integer out of range: {}", err))
    }
}
