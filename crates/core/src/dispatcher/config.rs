//! Dispatcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the allocation dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Lower bound of the simulated processing delay (milliseconds).
    #[serde(default = "default_min_delay")]
    pub min_delay_ms: u64,

    /// Upper bound of the simulated processing delay (milliseconds, inclusive).
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Deadline measured from submission (milliseconds).
    /// Requests still waiting when it passes are rejected without touching
    /// the store. Unset means no deadline.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,

    /// Intake buffer size. Unset means an unbounded intake; when set,
    /// `submit` waits while the buffer is full.
    #[serde(default)]
    pub intake_capacity: Option<usize>,
}

fn default_min_delay() -> u64 {
    100
}

fn default_max_delay() -> u64 {
    300
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
            request_timeout_ms: None,
            intake_capacity: None,
        }
    }
}

impl DispatcherConfig {
    /// Config without processing delay, useful in tests.
    pub fn immediate() -> Self {
        Self {
            min_delay_ms: 0,
            max_delay_ms: 0,
            ..Default::default()
        }
    }

    /// Per-request deadline, if configured.
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
