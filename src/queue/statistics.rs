//! Queue Statistics
//!
//! Point-in-time snapshot of a queue's counters. Every field is read under a
//! single lock acquisition, so the values are consistent with each other but
//! may be stale as soon as they are returned.

use crate::queue::lifecycle::QueueState;
use serde::Serialize;

/// Consistent snapshot of a bounded queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueStatistics {
    /// Number of items currently buffered
    pub queue_size: usize,

    /// Maximum number of buffered items
    pub capacity: usize,

    /// Producers currently allowed to put
    pub active_producers: usize,

    /// Successful puts since creation
    pub total_put: u64,

    /// Successful takes since creation
    pub total_taken: u64,

    /// Lifecycle state at the time of the snapshot
    #[serde(serialize_with = "serialize_state")]
    pub state: QueueState,
}

impl QueueStatistics {
    /// Items that have been put but not yet taken
    pub fn in_flight(&self) -> u64 {
        self.total_put - self.total_taken
    }

    /// Buffer occupancy as a percentage of capacity
    pub fn utilisation(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        (self.queue_size as f64 / self.capacity as f64) * 100.0
    }

    pub fn is_closed(&self) -> bool {
        !matches!(self.state, QueueState::Open)
    }
}

fn serialize_state<S: serde::Serializer>(state: &QueueState, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(state)
}
