/*!
 * Closable Blocking Queue
 * FIFO queue with blocking pop, non-blocking variants, and permanent close
 */

use super::cancel::{CancelToken, Interrupt};
use crate::core::errors::{SyncError, SyncResult};
use crate::core::value::{ensure_shareable, Shareable};
use crate::monitoring::QueueStats;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Everything guarded by the queue lock
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
    /// Poppers currently parked on `ready`
    waiters: usize,
}

struct Shared<T> {
    state: Mutex<QueueState<T>>,
    ready: Condvar,
}

impl<T: Send> Interrupt for Shared<T> {
    fn interrupt(&self) {
        // Taking the lock orders this wake after any in-progress flag check
        let _state = self.state.lock();
        self.ready.notify_all();
    }
}

/// How a blocking pop is allowed to end besides item/close
#[derive(Clone, Copy)]
struct WaitLimits<'a> {
    deadline: Option<Instant>,
    token: Option<&'a CancelToken>,
}

/// FIFO queue shared across threads
///
/// # States
///
/// `Open-Empty`, `Open-NonEmpty`, `Closed-Empty`, `Closed-NonEmpty`. `push`
/// is rejected once closed, `pop` keeps draining items left behind by
/// `close`, and nothing ever reopens a closed queue.
///
/// # Wakeups
///
/// Every wait condition is evaluated under the same lock `push` and `close`
/// mutate under, and re-evaluated after each wake, so neither lost nor
/// spurious wakeups leak out to callers.
///
/// # Example
///
/// ```
/// use shareable_sync::{ClosableQueue, SyncError};
/// use std::sync::Arc;
/// use std::thread;
///
/// let queue = Arc::new(ClosableQueue::new());
///
/// let consumer = {
///     let queue = queue.clone();
///     thread::spawn(move || queue.pop())
/// };
///
/// queue.push(42_i64).unwrap();
/// assert_eq!(consumer.join().unwrap(), Some(42));
///
/// queue.close();
/// assert_eq!(queue.push(7), Err(SyncError::QueueClosed));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct ClosableQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T: Shareable + Send> ClosableQueue<T> {
    /// Create an empty, open queue
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(QueueState {
                    items: VecDeque::new(),
                    closed: false,
                    waiters: 0,
                }),
                ready: Condvar::new(),
            }),
        }
    }

    /// Append `value` and wake one blocked popper
    ///
    /// Fails with `InvalidArgument` for non-shareable values and
    /// `QueueClosed` once the queue is closed.
    pub fn push(&self, value: T) -> SyncResult<()> {
        ensure_shareable("value", &value)?;

        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(SyncError::QueueClosed);
        }
        state.items.push_back(value);
        if state.waiters > 0 {
            self.shared.ready.notify_one();
        }
        Ok(())
    }

    /// Remove the oldest item, blocking while the queue is empty and open
    ///
    /// Returns `None` once the queue is closed and drained.
    pub fn pop(&self) -> Option<T> {
        self.pop_inner(WaitLimits {
            deadline: None,
            token: None,
        })
    }

    /// `pop` that gives up after `timeout`
    ///
    /// A timeout too large to express as a deadline (`Duration::MAX`) waits
    /// like `pop`.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        self.pop_inner(WaitLimits {
            deadline: Instant::now().checked_add(timeout),
            token: None,
        })
    }

    /// Remove the oldest item without blocking
    pub fn try_pop(&self) -> Option<T> {
        self.shared.state.lock().items.pop_front()
    }

    pub fn empty(&self) -> bool {
        self.shared.state.lock().items.is_empty()
    }

    pub fn size(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    /// Drop every queued item; the open/closed state is unchanged
    pub fn clear(&self) {
        let drained = std::mem::take(&mut self.shared.state.lock().items);
        debug!(dropped = drained.len(), "queue cleared");
        // Items drop here, outside the lock
    }

    /// Close permanently and wake every blocked popper (idempotent)
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        if !state.closed {
            state.closed = true;
            debug!(
                pending = state.items.len(),
                waiters = state.waiters,
                "queue closed"
            );
        }
        self.shared.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Number of poppers currently blocked
    pub fn waiting(&self) -> usize {
        self.shared.state.lock().waiters
    }

    /// Snapshot of length, closed flag and waiters taken under one lock
    pub fn stats(&self) -> QueueStats {
        let state = self.shared.state.lock();
        QueueStats {
            length: state.items.len(),
            closed: state.closed,
            waiters: state.waiters,
        }
    }

    /// Visit every queued item in FIFO order while the lock is held
    ///
    /// Collector hook: `f` must not call back into this queue.
    pub fn trace<F>(&self, f: F)
    where
        F: FnMut(&T),
    {
        self.shared.state.lock().items.iter().for_each(f);
    }

    /// Approximate memory footprint in bytes
    pub fn memsize(&self) -> usize {
        std::mem::size_of::<Self>()
            + std::mem::size_of::<Shared<T>>()
            + self.size() * std::mem::size_of::<T>()
    }

    fn pop_inner(&self, limits: WaitLimits<'_>) -> Option<T> {
        let mut state = self.shared.state.lock();

        // Fast path: no waiting needed
        if let Some(item) = state.items.pop_front() {
            return Some(item);
        }
        if state.closed {
            return None;
        }

        state.waiters += 1;
        let outcome = loop {
            if limits.token.is_some_and(CancelToken::is_cancelled) {
                debug!("queue wait interrupted");
                // A push may have picked this waiter; hand the wakeup on
                if !state.items.is_empty() {
                    self.shared.ready.notify_one();
                }
                break None;
            }
            if let Some(item) = state.items.pop_front() {
                break Some(item);
            }
            if state.closed {
                break None;
            }

            match limits.deadline {
                Some(deadline) => {
                    if self.shared.ready.wait_until(&mut state, deadline).timed_out() {
                        // An item may have landed right at the deadline
                        let item = state.items.pop_front();
                        trace!(delivered = item.is_some(), "queue wait timed out");
                        break item;
                    }
                }
                None => self.shared.ready.wait(&mut state),
            }
        };
        state.waiters -= 1;
        outcome
    }
}

impl<T: Shareable + Send + 'static> ClosableQueue<T> {
    /// `pop` that returns `None` as soon as `token` is cancelled
    ///
    /// An interrupted wait consumes nothing: items that arrive concurrently
    /// stay queued for other poppers. Items already queued when the call
    /// starts are returned even if the token is cancelled.
    pub fn pop_with(&self, token: &CancelToken) -> Option<T> {
        let target: Weak<dyn Interrupt> = Arc::downgrade(&self.shared) as Weak<dyn Interrupt>;
        let _registration = token.register(target);

        self.pop_inner(WaitLimits {
            deadline: None,
            token: Some(token),
        })
    }
}

impl<T: Shareable + Send> Default for ClosableQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ClosableQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("ClosableQueue")
            .field("length", &state.items.len())
            .field("closed", &state.closed)
            .field("waiters", &state.waiters)
            .finish()
    }
}

impl<T> Shareable for ClosableQueue<T> {
    fn is_shareable(&self) -> bool {
        true
    }
}
