//! Board - the aggregator, its trackers and the totals display, wired up
//!
//! The board is the host side of the system: it turns terminal input into
//! tracker and aggregator calls.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tallystore::Aggregator;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::console::ConsoleTrigger;
use crate::display::{self, TotalsDisplay};
use crate::scheduler::Scheduler;
use crate::tracker::{ActionTrigger, OutputSink, Phase, Tracker, TrackerError, TrackerParts};

/// Label of the sink that receives the totals line
pub const TOTALS_LABEL: &str = "totals";

/// One line of user input
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Press the tracker's trigger (counts its delta)
    Trigger(String),
    /// Count an explicit amount
    Add(String, f64),
    /// Take one delta back off
    Undo(String),
    Reset(String),
    /// Forget the source's counters entirely
    Delete(String),
    Totals,
    List,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseActionError {
    #[error("empty input")]
    Empty,

    #[error("'{0}' needs a tracker name")]
    MissingTarget(String),

    #[error("'{0}' is not a finite number")]
    BadAmount(String),

    #[error("unexpected input after '{0}'")]
    TrailingInput(String),
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(ParseActionError::Empty)?;
        let arg = words.next();
        if words.next().is_some() {
            return Err(ParseActionError::TrailingInput(head.to_string()));
        }

        let target = |verb: &str| {
            arg.map(str::to_string)
                .ok_or_else(|| ParseActionError::MissingTarget(verb.to_string()))
        };
        let bare = |action: Action| match arg {
            Some(_) => Err(ParseActionError::TrailingInput(head.to_string())),
            None => Ok(action),
        };

        match head {
            "undo" => Ok(Action::Undo(target(head)?)),
            "reset" => Ok(Action::Reset(target(head)?)),
            "delete" => Ok(Action::Delete(target(head)?)),
            "totals" => bare(Action::Totals),
            "list" => bare(Action::List),
            "quit" | "exit" => bare(Action::Quit),
            id => match arg {
                None => Ok(Action::Trigger(id.to_string())),
                Some(text) => match text.parse::<f64>() {
                    // NaN or infinity would poison every later total
                    Ok(amount) if amount.is_finite() => Ok(Action::Add(id.to_string(), amount)),
                    _ => Err(ParseActionError::BadAmount(text.to_string())),
                },
            },
        }
    }
}

struct Slot {
    tracker: Tracker,
    trigger: Arc<ConsoleTrigger>,
}

/// A running set of trackers sharing one aggregator
pub struct Board {
    aggregator: Aggregator,
    slots: Vec<Slot>,
    _totals: Option<TotalsDisplay>,
}

impl Board {
    /// Create the aggregator and one tracker per configured source
    ///
    /// `make_sink` supplies the output sink for each tracker (by identifier)
    /// and for the totals display (by [`TOTALS_LABEL`]). Invalid trackers are
    /// kept, inert, so they show up in [`Board::warnings`].
    pub fn build<F>(config: &Config, scheduler: Arc<dyn Scheduler>, make_sink: F) -> Self
    where
        F: Fn(&str) -> Arc<dyn OutputSink>,
    {
        debug!(trackers = config.trackers.len(), "Board::build: called");
        let aggregator = Aggregator::new();
        let totals = config
            .show_totals
            .then(|| TotalsDisplay::attach(&aggregator, make_sink(TOTALS_LABEL)));

        let slots = config
            .trackers
            .iter()
            .map(|tracker_config| {
                let trigger = Arc::new(ConsoleTrigger::new());
                let parts = TrackerParts::new(trigger.clone(), make_sink(&tracker_config.identifier));
                let tracker = Tracker::new(
                    tracker_config.clone(),
                    parts,
                    aggregator.clone(),
                    Arc::clone(&scheduler),
                );
                Slot { tracker, trigger }
            })
            .collect::<Vec<_>>();

        let ready = slots.iter().filter(|s| s.tracker.warning().is_none()).count();
        info!(ready, total = slots.len(), "Board built");

        Self {
            aggregator,
            slots,
            _totals: totals,
        }
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn trackers(&self) -> impl Iterator<Item = &Tracker> {
        self.slots.iter().map(|slot| &slot.tracker)
    }

    /// First usable tracker with this identifier
    pub fn tracker(&self, id: &str) -> Option<&Tracker> {
        self.find(id).map(|slot| &slot.tracker)
    }

    fn find(&self, id: &str) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|slot| slot.tracker.identifier() == id && slot.tracker.warning().is_none())
    }

    /// Configuration problems, by position in the config
    pub fn warnings(&self) -> Vec<(usize, TrackerError)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.tracker.warning().map(|err| (i, err.clone())))
            .collect()
    }

    /// Identifier and phase of every tracker, in config order
    pub fn phases(&self) -> Vec<(String, Phase)> {
        self.trackers().map(|t| (t.identifier().to_string(), t.phase())).collect()
    }

    /// Carry out one action; returns lines for the host to print
    ///
    /// Tracker status goes to the tracker's own sink; the returned lines are
    /// replies that belong to no tracker.
    pub fn dispatch(&self, action: &Action) -> Vec<String> {
        debug!(?action, "Board::dispatch: called");
        match action {
            Action::Trigger(id) => match self.find(id) {
                Some(slot) if slot.trigger.is_enabled() => {
                    slot.tracker.increment(None);
                    Vec::new()
                }
                Some(_) => vec![format!("{id} is idle, wait for it to light up")],
                None => unknown(id),
            },
            Action::Add(id, amount) => self.with_tracker(id, |t| {
                t.increment(Some(*amount));
            }),
            Action::Undo(id) => self.with_tracker(id, |t| {
                t.decrement();
            }),
            Action::Reset(id) => self.with_tracker(id, |t| {
                t.reset_counter();
            }),
            Action::Delete(id) => {
                if !self.aggregator.contains(id) {
                    return vec![format!("{id} has no counts to delete")];
                }
                self.aggregator.delete(id);
                vec![format!("{id} deleted")]
            }
            Action::Totals => vec![display::totals_line(&self.aggregator.totals())],
            Action::List => self.list(),
            Action::Quit => Vec::new(),
        }
    }

    fn with_tracker(&self, id: &str, f: impl FnOnce(&Tracker)) -> Vec<String> {
        match self.find(id) {
            Some(slot) => {
                f(&slot.tracker);
                Vec::new()
            }
            None => unknown(id),
        }
    }

    fn list(&self) -> Vec<String> {
        let entries = self.aggregator.entries();
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let tracker = &slot.tracker;
                if let Some(err) = tracker.warning() {
                    return format!("#{i} {}: {err}", Phase::Uninitialized);
                }
                let id = tracker.identifier();
                let counts = entries
                    .iter()
                    .find(|(key, _)| key == id)
                    .map(|(_, entry)| entry.to_string())
                    .unwrap_or_else(|| "no changes yet".to_string());
                format!("{id}: {} · {counts}", tracker.phase())
            })
            .collect()
    }

    /// Stop every tracker's cycle
    pub fn shutdown(&self) {
        info!("Board shutting down");
        for slot in &self.slots {
            slot.tracker.shutdown();
        }
    }
}

fn unknown(id: &str) -> Vec<String> {
    warn!(%id, "Board: unknown tracker");
    vec![format!("no tracker named '{id}'")]
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("trackers", &self.slots.len())
            .field("aggregator", &self.aggregator)
            .finish()
    }
}
