//! Trackers - one per counted source
//!
//! A tracker forwards user actions (increment, reset) into the shared
//! [`tallystore::Aggregator`] and runs an endless timer-driven highlight
//! cycle:
//!
//! ```text
//!  Uninitialized ──config ok──▶ Idle ──idle timer──▶ Active
//!        │                       ▲                     │
//!   config bad                   └────active timer─────┘
//!        ▼
//!  (stays Uninitialized, warning logged)
//! ```

mod collab;
mod config;
mod controller;
mod error;
mod highlight;

pub use collab::{ActionTrigger, MemoryStyleStore, OutputSink, StyleStore, TrackerParts};
pub use config::{DEFAULT_IDLE_FREQUENCY_MS, TrackerConfig};
pub use controller::{Phase, Tracker};
pub use error::TrackerError;
pub use highlight::{HIGHLIGHT_PROPERTIES, SavedStyles, highlight_overrides};
