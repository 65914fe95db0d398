//! Queue Configuration Module
//!
//! Serializable construction parameters for a bounded queue, with presets and
//! TOML loading so hosts can keep queue sizing in their own config files.

use crate::queue::error::{QueueError, QueueResult};
use serde::{Deserialize, Serialize};

/// Construction parameters of a bounded queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of buffered items (must be > 0)
    pub capacity: usize,

    /// Initial number of active producers (0 = producers register dynamically)
    pub expected_producers: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 1024,
            expected_producers: 0,
        }
    }
}

impl QueueConfig {
    pub fn new(capacity: usize, expected_producers: usize) -> Self {
        Self {
            capacity,
            expected_producers,
        }
    }

    /// Validate construction parameters
    pub fn validate(&self) -> QueueResult<()> {
        if self.capacity == 0 {
            return Err(QueueError::contract_violation(
                "queue capacity must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Queue configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePreset {
    /// Capacity 1: every put synchronizes directly with a take
    Handoff,
    /// Default sizing for general use
    Balanced,
    /// Large buffer for bursty producers
    HighThroughput,
}

impl QueuePreset {
    /// Get queue configuration for this preset
    pub fn config(self) -> QueueConfig {
        match self {
            QueuePreset::Handoff => QueueConfig {
                capacity: 1,
                ..Default::default()
            },

            QueuePreset::Balanced => QueueConfig::default(),

            QueuePreset::HighThroughput => QueueConfig {
                capacity: 65_536,
                ..Default::default()
            },
        }
    }
}

/// Load queue configuration from TOML string
pub fn load_queue_config(toml_str: &str) -> Result<QueueConfig, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Save queue configuration to TOML string
pub fn save_queue_config(config: &QueueConfig) -> Result<String, toml::ser::Error> {
    toml::to_string_pretty(config)
}
