//! Bounded Multi-Producer / Multi-Consumer Blocking Queue
//!
//! This module provides a fixed-capacity FIFO queue for handing owned items
//! between threads, together with a shutdown protocol driven by producer
//! counting: when the last registered producer completes, the queue closes
//! itself and consumers drain what is left and then see end-of-stream.
//!
//! # Architecture
//!
//! - **BoundedQueue**: buffer, capacity, blocking/non-blocking/timed put and take
//! - **Lifecycle**: producer registry and the terminal `closed` flag
//! - **Producer / Consumer / Closer**: RAII handles for the usage protocol
//! - **CancelToken**: releases blocked cancellable waiters without closing
//! - **QueueStatistics**: consistent snapshots of the counters
//!
//! # Usage
//!
//! ```rust
//! use boundq::queue::{BoundedQueue, TakeError};
//! use std::thread;
//!
//! let queue = BoundedQueue::new(4, 1).unwrap();
//!
//! let producer = queue.clone();
//! let handle = thread::spawn(move || {
//!     for value in [10, 20, 30] {
//!         producer.put(value).unwrap();
//!     }
//!     producer.producer_done().unwrap();
//! });
//!
//! let mut received = Vec::new();
//! loop {
//!     match queue.take() {
//!         Ok(value) => received.push(value),
//!         Err(TakeError::ClosedEmpty) => break,
//!         Err(e) => panic!("unexpected error: {}", e),
//!     }
//! }
//! handle.join().unwrap();
//! assert_eq!(received, vec![10, 20, 30]);
//! ```

pub mod bounded;
pub mod cancel;
pub mod client;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod statistics;

// Re-export main types for convenience
pub use bounded::BoundedQueue;
pub use cancel::CancelToken;
pub use client::{Closer, Consumer, Producer};
pub use config::{load_queue_config, save_queue_config, QueueConfig, QueuePreset};
pub use error::{ErrorKind, PutError, QueueError, QueueResult, TakeError};
pub use lifecycle::{CloseCause, QueueState};
pub use statistics::QueueStatistics;

#[cfg(test)]
mod tests;
