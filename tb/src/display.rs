//! Human-readable rendering of counter entries and totals

use std::sync::Arc;

use tallystore::{Aggregator, CounterEntry, Subscription};
use tracing::debug;

use crate::tracker::OutputSink;

/// Lines shown after a tracker counts a change
pub fn entry_lines(id: &str, entry: &CounterEntry) -> Vec<String> {
    let plural = if entry.changed == 1 { "" } else { "s" };
    vec![
        format!("{id} has been updated {} time{plural}", entry.changed),
        format!("The new total is {}", entry.value),
        format!("Updated: {}", entry.updated_label()),
    ]
}

/// Lines shown after a tracker is reset
pub fn reset_lines(id: &str, entry: &CounterEntry) -> Vec<String> {
    vec![
        format!("{id} has been reset"),
        format!("The new total is {}", entry.value),
        format!("Updated: {}", entry.updated_label()),
    ]
}

/// One-line summary of a totals snapshot
pub fn totals_line(totals: &CounterEntry) -> String {
    format!(
        "no. of changes: {} · grand total: {} · last updated: {}",
        totals.changed,
        totals.value,
        totals.updated_label()
    )
}

/// Renders every published totals snapshot into a sink
///
/// Stays subscribed for as long as it is alive.
pub struct TotalsDisplay {
    _subscription: Subscription,
}

impl TotalsDisplay {
    pub fn attach(aggregator: &Aggregator, sink: Arc<dyn OutputSink>) -> Self {
        debug!("TotalsDisplay::attach: called");
        let subscription = aggregator.subscribe(move |totals| sink.display(&[totals_line(totals)]));
        Self {
            _subscription: subscription,
        }
    }
}
