//! Bounded Blocking Queue Implementation
//!
//! Core multi-producer / multi-consumer queue. One `parking_lot::Mutex`
//! guards the buffer, the producer registry, the terminal flag and the
//! counters; two condition variables (`not_full`, `not_empty`) carry
//! targeted wakeups. A successful put wakes one taker, a successful take
//! wakes one putter, and the transition to closed wakes everybody.
//!
//! `BoundedQueue` is a cheap cloneable handle. All clones share the same
//! buffer; the buffer and any residual items are dropped with the last one.

use crate::queue::cancel::{CancelToken, WakeWaiters};
use crate::queue::config::QueueConfig;
use crate::queue::error::{PutError, QueueResult, TakeError};
use crate::queue::lifecycle::{CloseCause, Lifecycle, QueueState};
use crate::queue::statistics::QueueStatistics;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// State guarded by the queue mutex
struct Inner<T> {
    buffer: VecDeque<T>,
    lifecycle: Lifecycle,
    total_put: u64,
    total_taken: u64,
}

impl<T> Inner<T> {
    fn state(&self) -> QueueState {
        QueueState::from_parts(self.lifecycle.is_closed(), self.buffer.len())
    }
}

/// Shared between every handle of one queue
pub(crate) struct Shared<T> {
    id: u64,
    capacity: usize,
    inner: Mutex<Inner<T>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl<T> Shared<T> {
    pub(crate) fn close(&self) {
        let cause = self.inner.lock().lifecycle.close();
        if let Some(cause) = cause {
            self.on_closed(cause);
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.inner.lock().lifecycle.is_closed()
    }

    /// Release every waiter after the terminal flag flipped
    fn on_closed(&self, cause: CloseCause) {
        let takers = self.not_empty.notify_all();
        let putters = self.not_full.notify_all();
        log::debug!(
            "Queue #{} closed ({:?}), released {} takers and {} putters",
            self.id,
            cause,
            takers,
            putters
        );
    }
}

impl<T: Send> WakeWaiters for Shared<T> {
    fn wake_all_waiters(&self) {
        // Holding the lock orders the wakeup after any in-progress guard check
        let _guard = self.inner.lock();
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    fn queue_id(&self) -> u64 {
        self.id
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let residual = self.inner.get_mut().buffer.len();
        if residual > 0 {
            log::debug!(
                "Queue #{} dropped with {} residual items",
                self.id,
                residual
            );
        }
    }
}

/// Bounded FIFO queue with blocking, non-blocking, timed and cancellable
/// put/take, plus producer-counted shutdown.
pub struct BoundedQueue<T> {
    shared: Arc<Shared<T>>,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items, expecting
    /// `expected_producers` producers to call [`producer_done`](Self::producer_done).
    ///
    /// `capacity == 0` is a contract violation.
    pub fn new(capacity: usize, expected_producers: usize) -> QueueResult<Self> {
        Self::from_config(&QueueConfig::new(capacity, expected_producers))
    }

    /// Create a queue from a validated configuration
    pub fn from_config(config: &QueueConfig) -> QueueResult<Self> {
        config.validate()?;

        let id = NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed);
        let shared = Shared {
            id,
            capacity: config.capacity,
            inner: Mutex::new(Inner {
                // Preallocated so appending never reallocates under the lock
                buffer: VecDeque::with_capacity(config.capacity),
                lifecycle: Lifecycle::new(config.expected_producers),
                total_put: 0,
                total_taken: 0,
            }),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        };

        log::debug!(
            "Created queue #{} with capacity {} and {} expected producers",
            id,
            config.capacity,
            config.expected_producers
        );
        Ok(Self {
            shared: Arc::new(shared),
        })
    }

    /// Process-unique identifier of this queue, used in log output
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    pub(crate) fn shared(&self) -> &Arc<Shared<T>> {
        &self.shared
    }

    // Producer Interface

    /// Put an item, blocking while the buffer is full.
    ///
    /// Fails with [`PutError::Closed`] if the queue is or becomes closed
    /// before space frees up; the item is handed back in the error.
    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        self.put_blocking(item, None, None)
    }

    /// Put an item without blocking
    pub fn try_put(&self, item: T) -> Result<(), PutError<T>> {
        let mut inner = self.shared.inner.lock();
        if inner.lifecycle.is_closed() {
            return Err(PutError::Closed(item));
        }
        if inner.buffer.len() >= self.shared.capacity {
            return Err(PutError::WouldBlock(item));
        }
        self.append(inner, item);
        Ok(())
    }

    /// Put an item, waiting at most `timeout` for space
    pub fn put_for(&self, item: T, timeout: Duration) -> Result<(), PutError<T>> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.put_until(item, deadline),
            None => self.put(item),
        }
    }

    /// Put an item, waiting for space until the monotonic `deadline`
    pub fn put_until(&self, item: T, deadline: Instant) -> Result<(), PutError<T>> {
        self.put_blocking(item, Some(deadline), None)
    }

    /// Put an item, blocking until space frees up, the queue closes, or
    /// `token` is cancelled.
    ///
    /// A token issued by another queue can never wake this one, so it is
    /// refused up front with [`PutError::Cancelled`].
    pub fn put_cancellable(&self, item: T, token: &CancelToken) -> Result<(), PutError<T>> {
        if !self.owns_token(token) {
            return Err(PutError::Cancelled(item));
        }
        self.put_blocking(item, None, Some(token))
    }

    fn put_blocking(
        &self,
        item: T,
        deadline: Option<Instant>,
        token: Option<&CancelToken>,
    ) -> Result<(), PutError<T>> {
        let capacity = self.shared.capacity;
        let mut inner = self.shared.inner.lock();

        loop {
            if inner.lifecycle.is_closed() {
                return Err(PutError::Closed(item));
            }
            if token.map_or(false, CancelToken::is_cancelled) {
                // We may have absorbed a notify_one meant for a putter
                if inner.buffer.len() < capacity {
                    self.shared.not_full.notify_one();
                }
                return Err(PutError::Cancelled(item));
            }
            if inner.buffer.len() < capacity {
                break;
            }
            match deadline {
                None => self.shared.not_full.wait(&mut inner),
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(PutError::Timeout(item));
                    }
                    // Timing out is decided on the next pass, after the guard re-check
                    let _ = self.shared.not_full.wait_until(&mut inner, deadline);
                }
            }
        }

        self.append(inner, item);
        Ok(())
    }

    /// Append under the held lock, then wake one taker once the lock is released
    fn append(&self, mut inner: parking_lot::MutexGuard<'_, Inner<T>>, item: T) {
        inner.buffer.push_back(item);
        inner.total_put += 1;
        let size = inner.buffer.len();
        drop(inner);

        self.shared.not_empty.notify_one();
        log::trace!("Put item on queue #{}, size: {}", self.shared.id, size);
    }

    // Consumer Interface

    /// Take the oldest item, blocking while the buffer is empty and the
    /// queue is open.
    ///
    /// Fails with [`TakeError::ClosedEmpty`] once the queue is closed and
    /// drained, which is the normal end-of-stream signal.
    pub fn take(&self) -> Result<T, TakeError> {
        self.take_blocking(None, None)
    }

    /// Take the oldest item without blocking
    pub fn try_take(&self) -> Result<T, TakeError> {
        let mut inner = self.shared.inner.lock();
        if inner.buffer.is_empty() {
            return Err(if inner.lifecycle.is_closed() {
                TakeError::ClosedEmpty
            } else {
                TakeError::WouldBlock
            });
        }
        Ok(self.remove_front(inner))
    }

    /// Take the oldest item, waiting at most `timeout` for one to arrive
    pub fn take_for(&self, timeout: Duration) -> Result<T, TakeError> {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.take_until(deadline),
            None => self.take(),
        }
    }

    /// Take the oldest item, waiting until the monotonic `deadline`
    pub fn take_until(&self, deadline: Instant) -> Result<T, TakeError> {
        self.take_blocking(Some(deadline), None)
    }

    /// Take the oldest item, blocking until one arrives, the queue is
    /// closed and drained, or `token` is cancelled.
    ///
    /// A token issued by another queue is refused with [`TakeError::Cancelled`].
    pub fn take_cancellable(&self, token: &CancelToken) -> Result<T, TakeError> {
        if !self.owns_token(token) {
            return Err(TakeError::Cancelled);
        }
        self.take_blocking(None, Some(token))
    }

    fn take_blocking(
        &self,
        deadline: Option<Instant>,
        token: Option<&CancelToken>,
    ) -> Result<T, TakeError> {
        let mut inner = self.shared.inner.lock();

        loop {
            if token.map_or(false, CancelToken::is_cancelled) {
                // Pass on a notify_one we may have absorbed
                if !inner.buffer.is_empty() {
                    self.shared.not_empty.notify_one();
                }
                return Err(TakeError::Cancelled);
            }
            if !inner.buffer.is_empty() {
                break;
            }
            if inner.lifecycle.is_closed() {
                return Err(TakeError::ClosedEmpty);
            }
            match deadline {
                None => self.shared.not_empty.wait(&mut inner),
                Some(deadline) => {
                    if Instant::now() >= deadline {
                        return Err(TakeError::Timeout);
                    }
                    let _ = self.shared.not_empty.wait_until(&mut inner, deadline);
                }
            }
        }

        Ok(self.remove_front(inner))
    }

    /// Pop the front item under the held lock, then wake one putter
    fn remove_front(&self, mut inner: parking_lot::MutexGuard<'_, Inner<T>>) -> T {
        let item = match inner.buffer.pop_front() {
            Some(item) => item,
            // Callers only get here after observing a non-empty buffer under this guard
            None => unreachable!("remove_front called on an empty buffer"),
        };
        inner.total_taken += 1;
        let size = inner.buffer.len();
        let drained = size == 0 && inner.lifecycle.is_closed();
        drop(inner);

        self.shared.not_full.notify_one();
        if drained {
            log::debug!("Queue #{} drained: draining -> closed-empty", self.shared.id);
        } else {
            log::trace!("Took item from queue #{}, size: {}", self.shared.id, size);
        }
        item
    }

    fn owns_token(&self, token: &CancelToken) -> bool {
        if token.queue_id() == self.shared.id {
            return true;
        }
        log::warn!(
            "Queue #{} refused cancel token issued by queue #{}",
            self.shared.id,
            token.queue_id()
        );
        false
    }

    // Lifecycle Interface

    /// Admit one more producer. Fails with `QueueError::Closed` once the
    /// queue is closed, including while it is still draining.
    pub fn register_producer(&self) -> QueueResult<()> {
        let active = {
            let mut inner = self.shared.inner.lock();
            inner.lifecycle.register_producer()?;
            inner.lifecycle.active_producers()
        };
        log::trace!("Queue #{} registered producer, active: {}", self.shared.id, active);
        Ok(())
    }

    /// Retire one producer. The call that retires the last active producer
    /// closes the queue and wakes every waiter.
    ///
    /// A call without a matching registration is a contract violation and
    /// leaves the queue unchanged.
    pub fn producer_done(&self) -> QueueResult<()> {
        let (cause, active) = {
            let mut inner = self.shared.inner.lock();
            let cause = inner.lifecycle.producer_done()?;
            (cause, inner.lifecycle.active_producers())
        };
        log::trace!("Queue #{} producer done, active: {}", self.shared.id, active);

        if let Some(cause) = cause {
            self.shared.on_closed(cause);
        }
        Ok(())
    }

    /// Close the queue for supervisory shutdown. Buffered items stay
    /// available to takers. Calling it again has no effect.
    pub fn close(&self) {
        self.shared.close();
    }

    // Status and Monitoring

    /// Number of buffered items
    pub fn size(&self) -> usize {
        self.shared.inner.lock().buffer.len()
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.inner.lock().buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.shared.inner.lock().buffer.len() >= self.shared.capacity
    }

    /// Number of producers currently allowed to put
    pub fn active_producers(&self) -> usize {
        self.shared.inner.lock().lifecycle.active_producers()
    }

    pub fn state(&self) -> QueueState {
        self.shared.inner.lock().state()
    }

    /// Consistent snapshot of every counter
    pub fn statistics(&self) -> QueueStatistics {
        let inner = self.shared.inner.lock();
        QueueStatistics {
            queue_size: inner.buffer.len(),
            capacity: self.shared.capacity,
            active_producers: inner.lifecycle.active_producers(),
            total_put: inner.total_put,
            total_taken: inner.total_taken,
            state: inner.state(),
        }
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Issue a token that can cancel blocked cancellable operations on this queue
    pub fn cancel_token(&self) -> CancelToken {
        let waiters: Arc<dyn WakeWaiters> = self.shared.clone();
        CancelToken::new(waiters)
    }
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> fmt::Debug for BoundedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.shared.inner.lock();
        f.debug_struct("BoundedQueue")
            .field("id", &self.shared.id)
            .field("capacity", &self.shared.capacity)
            .field("size", &inner.buffer.len())
            .field("active_producers", &inner.lifecycle.active_producers())
            .field("state", &inner.state())
            .finish()
    }
}
