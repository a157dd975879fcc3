//! Per-source counter values

use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Label rendered for an entry that has never been mutated
pub const NEVER_UPDATED: &str = "never";

/// Counter state for one source identifier
///
/// Also used as the shape of the totals snapshot, where `updated` is the
/// time the snapshot was computed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CounterEntry {
    /// Number of mutating operations applied
    pub changed: u64,

    /// Signed accumulated total
    pub value: f64,

    /// Time of the last mutation; `None` means never
    pub updated: Option<DateTime<Local>>,
}

impl CounterEntry {
    /// A fresh entry: no changes, zero value, never updated
    pub fn zeroed() -> Self {
        Self::default()
    }

    /// True until the first mutation
    pub fn is_untouched(&self) -> bool {
        self.updated.is_none()
    }

    /// Wall-clock time of the last update, or "never"
    pub fn updated_label(&self) -> String {
        match self.updated {
            Some(ts) => ts.format("%H:%M:%S").to_string(),
            None => NEVER_UPDATED.to_string(),
        }
    }
}

impl fmt::Display for CounterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} changes, total {}, updated {}",
            self.changed,
            self.value,
            self.updated_label()
        )
    }
}
