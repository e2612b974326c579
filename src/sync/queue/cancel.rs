/*!
 * Cancellation Tokens
 *
 * External interruption signal for blocking queue waits. A token can be
 * handed to another thread; calling `cancel()` there makes every wait
 * registered on it return `None` promptly.
 *
 * # Race freedom
 *
 * A waiter registers with the token before it checks the cancelled flag
 * under the queue lock. `cancel()` sets the flag before it collects the
 * registrations, and each interrupt re-takes the queue lock before
 * notifying. Either the waiter sees the flag on its check, or it is already
 * parked when the notification arrives; there is no window in between.
 */

use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::debug;

/// Something a cancelled token must wake
pub(crate) trait Interrupt: Send + Sync {
    /// Wake every waiter so it re-checks its token; must take the lock the
    /// waiters sleep under
    fn interrupt(&self);
}

struct TokenState {
    cancelled: AtomicBool,
    next_id: AtomicU64,
    targets: Mutex<Vec<(u64, Weak<dyn Interrupt>)>>,
}

/// Cloneable cancellation handle; all clones share one flag
///
/// Cancellation is permanent: a cancelled token interrupts every later wait
/// it is passed to as well.
#[derive(Clone)]
pub struct CancelToken {
    state: Arc<TokenState>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self {
            state: Arc::new(TokenState {
                cancelled: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
                targets: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Interrupt every wait registered on this token (idempotent)
    pub fn cancel(&self) {
        if self.state.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }

        // Collect first so no token lock is held while queue locks are taken
        let targets: Vec<Arc<dyn Interrupt>> = self
            .state
            .targets
            .lock()
            .iter()
            .filter_map(|(_, target)| target.upgrade())
            .collect();

        debug!(waits = targets.len(), "cancel token fired");
        for target in targets {
            target.interrupt();
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Register `target` for the lifetime of the returned guard
    pub(crate) fn register(&self, target: Weak<dyn Interrupt>) -> Registration<'_> {
        let id = self.state.next_id.fetch_add(1, Ordering::Relaxed);
        self.state.targets.lock().push((id, target));
        Registration { token: self, id }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Unregisters a wait from its token on drop
pub(crate) struct Registration<'a> {
    token: &'a CancelToken,
    id: u64,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.token
            .state
            .targets
            .lock()
            .retain(|(id, _)| *id != self.id);
    }
}
