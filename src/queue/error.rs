//! Queue Error Types
//!
//! Defines the refusal kinds of the bounded queue. Producer-side errors hand
//! the rejected item back to the caller so nothing is lost on failure.

use std::fmt;
use thiserror::Error;

/// Result type for lifecycle and construction operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Flat classification of every error the queue can return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Queue is closed to new items
    Closed,
    /// Queue is closed and drained (normal end-of-stream)
    ClosedEmpty,
    /// Non-blocking operation would have suspended
    WouldBlock,
    /// Timed operation exceeded its deadline
    Timeout,
    /// Waiter was released by its cancellation token
    Cancelled,
    /// Detected misuse of the queue
    ContractViolation,
}

/// Errors from lifecycle operations and queue construction
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is closed; no new producers may register
    #[error("Queue is closed")]
    Closed,

    /// The caller broke the queue usage protocol
    #[error("Queue contract violation: {message}")]
    ContractViolation { message: String },
}

impl QueueError {
    /// Create a contract violation error
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::ContractViolation {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            QueueError::Closed => ErrorKind::Closed,
            QueueError::ContractViolation { .. } => ErrorKind::ContractViolation,
        }
    }
}

/// Failure to enqueue an item; the item is returned untouched
#[derive(Error, Clone, PartialEq, Eq)]
pub enum PutError<T> {
    #[error("Queue is closed - item was not enqueued")]
    Closed(T),

    #[error("Queue is full - put would block")]
    WouldBlock(T),

    #[error("Timed out waiting for queue space")]
    Timeout(T),

    #[error("Put was cancelled while waiting for queue space")]
    Cancelled(T),
}

impl<T> PutError<T> {
    /// Recover the item that was not enqueued
    pub fn into_inner(self) -> T {
        match self {
            PutError::Closed(item)
            | PutError::WouldBlock(item)
            | PutError::Timeout(item)
            | PutError::Cancelled(item) => item,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PutError::Closed(_) => ErrorKind::Closed,
            PutError::WouldBlock(_) => ErrorKind::WouldBlock,
            PutError::Timeout(_) => ErrorKind::Timeout,
            PutError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, PutError::Closed(_))
    }
}

// Items are opaque, so Debug never requires `T: Debug`.
impl<T> fmt::Debug for PutError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PutError::Closed(_) => "Closed",
            PutError::WouldBlock(_) => "WouldBlock",
            PutError::Timeout(_) => "Timeout",
            PutError::Cancelled(_) => "Cancelled",
        };
        write!(f, "{}(..)", name)
    }
}

/// Failure to dequeue an item
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TakeError {
    /// Queue is closed and fully drained
    #[error("Queue is closed and drained")]
    ClosedEmpty,

    #[error("Queue is empty - take would block")]
    WouldBlock,

    #[error("Timed out waiting for an item")]
    Timeout,

    #[error("Take was cancelled while waiting for an item")]
    Cancelled,
}

impl TakeError {
    /// True for the normal end-of-stream signal, which is not a failure
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, TakeError::ClosedEmpty)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TakeError::ClosedEmpty => ErrorKind::ClosedEmpty,
            TakeError::WouldBlock => ErrorKind::WouldBlock,
            TakeError::Timeout => ErrorKind::Timeout,
            TakeError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
