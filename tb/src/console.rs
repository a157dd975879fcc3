//! Terminal host collaborators

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use colored::*;

use crate::tracker::{ActionTrigger, OutputSink};

/// Trigger backed by a flag; the board consults it before honouring input
#[derive(Debug, Default)]
pub struct ConsoleTrigger {
    enabled: AtomicBool,
}

impl ConsoleTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActionTrigger for ConsoleTrigger {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }
}

/// Prints each line to stdout behind a colored `[label]` prefix
#[derive(Debug, Clone)]
pub struct ConsoleSink {
    label: String,
}

impl ConsoleSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl OutputSink for ConsoleSink {
    fn display(&self, lines: &[String]) {
        let prefix = format!("[{}]", self.label).cyan();
        for line in lines {
            println!("{prefix} {line}");
        }
    }
}

/// Keeps every displayed line in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything displayed so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Drain everything displayed so far
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.lines.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl OutputSink for RecordingSink {
    fn display(&self, lines: &[String]) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(lines);
    }
}
