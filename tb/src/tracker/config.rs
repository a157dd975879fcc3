//! Per-tracker configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default wait before (re)activating: 100 seconds
pub const DEFAULT_IDLE_FREQUENCY_MS: u64 = 100_000;

/// Options for a single tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Source identifier; also the highlight color. Empty means invalid.
    #[serde(default)]
    pub identifier: String,

    /// Amount added by a plain increment
    #[serde(default)]
    pub delta: f64,

    /// How long the highlight stays on
    #[serde(rename = "active-duration-ms", default)]
    pub active_duration_ms: u64,

    /// How long to wait before highlighting again
    #[serde(rename = "idle-frequency-ms", default = "default_idle_frequency_ms")]
    pub idle_frequency_ms: u64,
}

fn default_idle_frequency_ms() -> u64 {
    DEFAULT_IDLE_FREQUENCY_MS
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            identifier: String::new(),
            delta: 0.0,
            active_duration_ms: 0,
            idle_frequency_ms: DEFAULT_IDLE_FREQUENCY_MS,
        }
    }
}

impl TrackerConfig {
    /// Config for `identifier` with every other option defaulted
    pub fn named(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Default::default()
        }
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_cycle(mut self, active_duration_ms: u64, idle_frequency_ms: u64) -> Self {
        self.active_duration_ms = active_duration_ms;
        self.idle_frequency_ms = idle_frequency_ms;
        self
    }

    pub fn active_duration(&self) -> Duration {
        Duration::from_millis(self.active_duration_ms)
    }

    pub fn idle_frequency(&self) -> Duration {
        Duration::from_millis(self.idle_frequency_ms)
    }

    /// One full Idle + Active cycle
    pub fn period(&self) -> Duration {
        self.active_duration() + self.idle_frequency()
    }
}
