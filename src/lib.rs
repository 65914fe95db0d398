//! boundq: a bounded multi-producer / multi-consumer blocking queue with
//! producer-counted shutdown.

pub mod logging;
pub mod queue;

pub use queue::{
    BoundedQueue, CancelToken, Closer, Consumer, ErrorKind, Producer, PutError, QueueConfig,
    QueueError, QueueResult, QueueState, QueueStatistics, TakeError,
};
