//! Host collaborators a tracker talks to

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Something the user triggers to count (a button, a key, a command)
pub trait ActionTrigger: Send + Sync {
    fn set_enabled(&self, enabled: bool);
    fn is_enabled(&self) -> bool;
}

/// Where a tracker writes its status lines
pub trait OutputSink: Send + Sync {
    /// Replace the displayed text with `lines`
    fn display(&self, lines: &[String]);
}

/// Named visual properties of the tracker's element
pub trait StyleStore: Send + Sync {
    /// Current value, empty string when unset
    fn get_property(&self, name: &str) -> String;
    fn set_property(&self, name: &str, value: &str);
}

/// `StyleStore` kept in memory
#[derive(Debug, Default)]
pub struct MemoryStyleStore {
    properties: Mutex<HashMap<String, String>>,
}

impl MemoryStyleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(self, name: &str, value: &str) -> Self {
        self.set_property(name, value);
        self
    }

    /// Copy of every property currently set
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.properties.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl StyleStore for MemoryStyleStore {
    fn get_property(&self, name: &str) -> String {
        self.properties
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
            .unwrap_or_default()
    }

    fn set_property(&self, name: &str, value: &str) {
        self.properties
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.to_string());
    }
}

/// Collaborators handed to a tracker at construction
///
/// Trigger and sink are required; a tracker missing either stays inert.
#[derive(Clone)]
pub struct TrackerParts {
    pub trigger: Option<Arc<dyn ActionTrigger>>,
    pub sink: Option<Arc<dyn OutputSink>>,
    pub style: Arc<dyn StyleStore>,
}

impl TrackerParts {
    pub fn new(trigger: Arc<dyn ActionTrigger>, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            trigger: Some(trigger),
            sink: Some(sink),
            style: Arc::new(MemoryStyleStore::new()),
        }
    }

    pub fn with_style(mut self, style: Arc<dyn StyleStore>) -> Self {
        self.style = style;
        self
    }
}

impl Default for TrackerParts {
    fn default() -> Self {
        Self {
            trigger: None,
            sink: None,
            style: Arc::new(MemoryStyleStore::new()),
        }
    }
}
