//! Producer and Consumer Handles
//!
//! RAII wrappers for the usage protocol: a [`Producer`] registers itself on
//! creation and retires exactly once when finished or dropped (including
//! during a panic), a [`Consumer`] iterates until end-of-stream, and a
//! [`Closer`] carries supervisory shutdown without knowing the item type.

use crate::queue::bounded::{BoundedQueue, Shared};
use crate::queue::cancel::CancelToken;
use crate::queue::error::{PutError, QueueResult, TakeError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// A registered producer. Dropping it calls `producer_done`.
pub struct Producer<T> {
    queue: BoundedQueue<T>,
    finished: bool,
}

impl<T> Producer<T> {
    fn register(queue: BoundedQueue<T>) -> QueueResult<Self> {
        queue.register_producer()?;
        Ok(Self {
            queue,
            finished: false,
        })
    }

    pub fn put(&self, item: T) -> Result<(), PutError<T>> {
        self.queue.put(item)
    }

    pub fn try_put(&self, item: T) -> Result<(), PutError<T>> {
        self.queue.try_put(item)
    }

    pub fn put_for(&self, item: T, timeout: Duration) -> Result<(), PutError<T>> {
        self.queue.put_for(item, timeout)
    }

    pub fn put_cancellable(&self, item: T, token: &CancelToken) -> Result<(), PutError<T>> {
        self.queue.put_cancellable(item, token)
    }

    /// Retire this producer now rather than at drop
    pub fn finish(mut self) -> QueueResult<()> {
        self.finished = true;
        self.queue.producer_done()
    }

    pub fn queue(&self) -> &BoundedQueue<T> {
        &self.queue
    }
}

impl<T> Drop for Producer<T> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if std::thread::panicking() {
            log::debug!("Producer on queue #{} abandoned during panic", self.queue.id());
        }
        if let Err(e) = self.queue.producer_done() {
            // Only reachable if someone retired this registration by hand
            log::warn!("Producer on queue #{} could not retire: {}", self.queue.id(), e);
        }
    }
}

impl<T> fmt::Debug for Producer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("queue_id", &self.queue.id())
            .field("finished", &self.finished)
            .finish()
    }
}

/// A consumer that yields items until the queue is closed and drained
pub struct Consumer<T> {
    queue: BoundedQueue<T>,
}

impl<T> Consumer<T> {
    pub fn take(&self) -> Result<T, TakeError> {
        self.queue.take()
    }

    pub fn try_take(&self) -> Result<T, TakeError> {
        self.queue.try_take()
    }

    pub fn take_for(&self, timeout: Duration) -> Result<T, TakeError> {
        self.queue.take_for(timeout)
    }

    pub fn take_cancellable(&self, token: &CancelToken) -> Result<T, TakeError> {
        self.queue.take_cancellable(token)
    }

    pub fn queue(&self) -> &BoundedQueue<T> {
        &self.queue
    }
}

impl<T> Iterator for Consumer<T> {
    type Item = T;

    /// Blocks for the next item; `None` means end-of-stream
    fn next(&mut self) -> Option<T> {
        match self.queue.take() {
            Ok(item) => Some(item),
            Err(TakeError::ClosedEmpty) => None,
            // An untimed, uncancellable take never reports these
            Err(TakeError::WouldBlock | TakeError::Timeout | TakeError::Cancelled) => None,
        }
    }
}

impl<T> fmt::Debug for Consumer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("queue_id", &self.queue.id())
            .finish()
    }
}

pub(crate) trait Shutdown: Send + Sync {
    fn close(&self);
    fn is_closed(&self) -> bool;
}

impl<T: Send> Shutdown for Shared<T> {
    fn close(&self) {
        Shared::close(self)
    }

    fn is_closed(&self) -> bool {
        Shared::is_closed(self)
    }
}

/// Supervisory shutdown handle, independent of the item type
#[derive(Clone)]
pub struct Closer {
    queue_id: u64,
    target: Arc<dyn Shutdown>,
}

impl Closer {
    /// Close the queue; see [`BoundedQueue::close`]
    pub fn close(&self) {
        log::debug!("Supervisory close requested for queue #{}", self.queue_id);
        self.target.close();
    }

    pub fn is_closed(&self) -> bool {
        self.target.is_closed()
    }
}

impl fmt::Debug for Closer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closer")
            .field("queue_id", &self.queue_id)
            .finish()
    }
}

impl<T> BoundedQueue<T> {
    /// Register a new producer and return its handle
    pub fn producer(&self) -> QueueResult<Producer<T>> {
        Producer::register(self.clone())
    }

    /// Create a consumer handle
    pub fn consumer(&self) -> Consumer<T> {
        Consumer {
            queue: self.clone(),
        }
    }
}

impl<T: Send + 'static> BoundedQueue<T> {
    /// Create a type-erased handle for supervisory shutdown
    pub fn closer(&self) -> Closer {
        let target: Arc<dyn Shutdown> = self.shared().clone();
        Closer {
            queue_id: self.id(),
            target,
        }
    }
}
