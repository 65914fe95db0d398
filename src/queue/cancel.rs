//! Waiter Cancellation
//!
//! A [`CancelToken`] releases blocked `put_cancellable` / `take_cancellable`
//! calls on the queue it was issued by. Cancellation is an extra guard in the
//! wait loop: the flag is re-checked under the queue lock, and `cancel()`
//! acquires that lock before notifying, so no waiter can miss it.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Something that can wake every waiter of one queue
pub(crate) trait WakeWaiters: Send + Sync {
    /// Acquire the queue lock and notify all waiters on every signal
    fn wake_all_waiters(&self);

    /// Identity of the queue, used to catch tokens crossing queues
    fn queue_id(&self) -> u64;
}

/// Cloneable cancellation token bound to one queue
#[derive(Clone)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    waiters: Arc<dyn WakeWaiters>,
}

impl CancelToken {
    pub(crate) fn new(waiters: Arc<dyn WakeWaiters>) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            waiters,
        }
    }

    /// Cancel every operation waiting on this token.
    ///
    /// Does not close the queue. Calling it again has no further effect.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        log::debug!("Cancel token fired for queue #{}", self.waiters.queue_id());
        self.waiters.wake_all_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn queue_id(&self) -> u64 {
        self.waiters.queue_id()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("queue_id", &self.waiters.queue_id())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    struct CountingWaker {
        wakes: AtomicUsize,
    }

    impl WakeWaiters for CountingWaker {
        fn wake_all_waiters(&self) {
            self.wakes.fetch_add(1, Ordering::SeqCst);
        }

        fn queue_id(&self) -> u64 {
            42
        }
    }

    #[test]
    fn test_cancel_wakes_once() {
        let waker = Arc::new(CountingWaker {
            wakes: AtomicUsize::new(0),
        });
        let token = CancelToken::new(waker.clone());
        let clone = token.clone();

        assert!(!token.is_cancelled());
        clone.cancel();
        token.cancel();

        assert!(token.is_cancelled());
        assert_eq!(waker.wakes.load(Ordering::SeqCst), 1);
        assert_eq!(token.queue_id(), 42);
        assert!(format!("{:?}", token).contains("cancelled: true"));
    }
}
