//! Queue Lifecycle Controller
//!
//! Tracks active producers and the terminal `closed` flag. The controller is
//! plain data: it lives inside the queue's mutex and every method here is
//! called with that lock held. Waking waiters is the caller's job, driven by
//! the [`CloseCause`] a transition reports.
//!
//! Only [`QueueState`] and [`CloseCause`] are visible outside the crate:
//!
//! ```compile_fail
//! use boundq::queue::lifecycle::Lifecycle;
//! ```

use crate::queue::error::{QueueError, QueueResult};
use std::fmt;

/// Observable state of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueState {
    /// Accepting puts and takes
    Open,
    /// Closed, but residual items remain to be taken
    Draining,
    /// Closed and drained; every put and take fails
    ClosedEmpty,
}

impl QueueState {
    /// Derive the state from the terminal flag and the buffer length
    pub fn from_parts(closed: bool, len: usize) -> Self {
        match (closed, len) {
            (false, _) => QueueState::Open,
            (true, 0) => QueueState::ClosedEmpty,
            (true, _) => QueueState::Draining,
        }
    }
}

impl fmt::Display for QueueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueState::Open => write!(f, "open"),
            QueueState::Draining => write!(f, "draining"),
            QueueState::ClosedEmpty => write!(f, "closed-empty"),
        }
    }
}

/// Why the queue transitioned to closed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCause {
    /// The last active producer completed
    ProducersDone,
    /// `close()` was called explicitly
    Explicit,
}

/// Producer registry plus terminal flag
#[derive(Debug)]
pub(crate) struct Lifecycle {
    active_producers: usize,
    closed: bool,
}

impl Lifecycle {
    /// Create a controller expecting `expected_producers` producers.
    ///
    /// Zero is legal: producers then register dynamically and the queue stays
    /// open until one registers and completes, or until `close()`.
    pub fn new(expected_producers: usize) -> Self {
        Self {
            active_producers: expected_producers,
            closed: false,
        }
    }

    pub fn active_producers(&self) -> usize {
        self.active_producers
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Admit one more producer
    pub fn register_producer(&mut self) -> QueueResult<()> {
        if self.closed {
            return Err(QueueError::Closed);
        }
        self.active_producers += 1;
        Ok(())
    }

    /// Retire one producer.
    ///
    /// Returns `Some(CloseCause::ProducersDone)` when this call is the one
    /// that closed the queue.
    pub fn producer_done(&mut self) -> QueueResult<Option<CloseCause>> {
        if self.active_producers == 0 {
            return Err(QueueError::contract_violation(
                "producer_done called without a matching registered producer",
            ));
        }
        self.active_producers -= 1;

        if self.active_producers == 0 && !self.closed {
            self.closed = true;
            return Ok(Some(CloseCause::ProducersDone));
        }
        Ok(None)
    }

    /// Close explicitly. Returns `Some(CloseCause::Explicit)` only on the
    /// first effective call; later calls are no-ops.
    pub fn close(&mut self) -> Option<CloseCause> {
        if self.closed {
            return None;
        }
        self.closed = true;
        Some(CloseCause::Explicit)
    }
}
