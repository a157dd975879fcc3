//! Tracker state machine

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tallystore::{Aggregator, CounterEntry};
use tracing::{debug, info, warn};

use crate::display;
use crate::scheduler::{Scheduler, TimerHandle};

use super::collab::{ActionTrigger, OutputSink, StyleStore, TrackerParts};
use super::config::TrackerConfig;
use super::error::TrackerError;
use super::highlight::{SavedStyles, highlight_overrides};

/// Where a tracker is in its highlight cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Invalid config or shut down; does nothing
    Uninitialized,
    /// Highlight off, trigger disabled, waiting `idle_frequency`
    Idle,
    /// Highlight on, trigger enabled, lasting `active_duration`
    Active,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Uninitialized => "Uninitialized",
            Phase::Idle => "Idle",
            Phase::Active => "Active",
        };
        f.write_str(name)
    }
}

struct CycleState {
    phase: Phase,
    /// Next scheduled transition
    timer: Option<TimerHandle>,
    activations: u64,
}

struct Inner {
    config: TrackerConfig,
    aggregator: Aggregator,
    scheduler: Arc<dyn Scheduler>,
    trigger: Option<Arc<dyn ActionTrigger>>,
    sink: Option<Arc<dyn OutputSink>>,
    style: Arc<dyn StyleStore>,
    warning: Option<TrackerError>,
    state: Mutex<CycleState>,
    /// Held while talking to the style store; taken before `state` when both are needed
    saved: Mutex<SavedStyles>,
}

/// Counts one source into the shared aggregator and cycles its highlight
///
/// Timer callbacks hold only a weak reference; dropping the tracker cancels
/// the pending transition and restores the original styles.
///
/// Collaborators are called with the phase lock released, so a trigger or
/// style store may read the tracker back (`phase()`, `activations()`). A
/// style store must not call [`Tracker::shutdown`].
pub struct Tracker {
    inner: Arc<Inner>,
}

fn validate(config: &TrackerConfig, parts: &TrackerParts) -> Result<(), TrackerError> {
    if config.identifier.is_empty() {
        return Err(TrackerError::MissingIdentifier);
    }
    if parts.trigger.is_none() {
        return Err(TrackerError::MissingTrigger(config.identifier.clone()));
    }
    if parts.sink.is_none() {
        return Err(TrackerError::MissingOutput(config.identifier.clone()));
    }
    Ok(())
}

impl Tracker {
    /// Build a tracker and, if its configuration is complete, start the cycle
    ///
    /// A valid tracker starts Idle with its trigger disabled and the first
    /// activation `idle_frequency` away. An invalid one logs a warning and
    /// stays Uninitialized; see [`Tracker::warning`].
    pub fn new(
        config: TrackerConfig,
        parts: TrackerParts,
        aggregator: Aggregator,
        scheduler: Arc<dyn Scheduler>,
    ) -> Self {
        debug!(identifier = %config.identifier, "Tracker::new: called");
        let warning = validate(&config, &parts).err();
        let inner = Arc::new(Inner {
            config,
            aggregator,
            scheduler,
            trigger: parts.trigger,
            sink: parts.sink,
            style: parts.style,
            warning,
            state: Mutex::new(CycleState {
                phase: Phase::Uninitialized,
                timer: None,
                activations: 0,
            }),
            saved: Mutex::new(SavedStyles::default()),
        });

        match &inner.warning {
            Some(err) => warn!(error = %err, "There was a problem loading a tracker"),
            None => Inner::start(&inner),
        }

        Self { inner }
    }

    pub fn identifier(&self) -> &str {
        &self.inner.config.identifier
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.inner.config
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock_state().phase
    }

    /// Configuration problem that kept this tracker Uninitialized
    pub fn warning(&self) -> Option<&TrackerError> {
        self.inner.warning.as_ref()
    }

    /// Times this tracker has entered Active
    pub fn activations(&self) -> u64 {
        self.inner.lock_state().activations
    }

    /// Whether the trigger currently accepts user actions
    pub fn trigger_enabled(&self) -> bool {
        self.inner.trigger.as_ref().is_some_and(|t| t.is_enabled())
    }

    /// Add `amount` (default: the configured delta) and show the new state
    ///
    /// Works in Idle and Active alike. Returns `None`, touching nothing, on an
    /// Uninitialized tracker.
    pub fn increment(&self, amount: Option<f64>) -> Option<CounterEntry> {
        if self.phase() == Phase::Uninitialized {
            debug!(identifier = %self.identifier(), "Tracker::increment: inert, ignoring");
            return None;
        }
        let id = self.identifier();
        let amount = amount.unwrap_or(self.inner.config.delta);
        let current = self.inner.aggregator.add(id, amount).get(id);
        info!(identifier = %id, amount, changed = current.changed, value = current.value, "Tracker: incremented");
        self.inner.show(&display::entry_lines(id, &current));
        Some(current)
    }

    /// Take the configured delta back off
    pub fn decrement(&self) -> Option<CounterEntry> {
        self.increment(Some(-self.inner.config.delta))
    }

    /// Zero this source's counters and show the result
    pub fn reset_counter(&self) -> Option<CounterEntry> {
        if self.phase() == Phase::Uninitialized {
            debug!(identifier = %self.identifier(), "Tracker::reset_counter: inert, ignoring");
            return None;
        }
        let id = self.identifier();
        let current = self.inner.aggregator.reset(id).get(id);
        info!(identifier = %id, "Tracker: reset");
        self.inner.show(&display::reset_lines(id, &current));
        Some(current)
    }

    /// Cancel the pending transition, restore styles and go inert
    pub fn shutdown(&self) {
        let timer = {
            let mut state = self.inner.lock_state();
            if state.phase == Phase::Uninitialized {
                return;
            }
            debug!(identifier = %self.identifier(), phase = %state.phase, "Tracker::shutdown: called");
            state.phase = Phase::Uninitialized;
            state.timer.take()
        };
        if let Some(timer) = timer {
            timer.cancel();
        }
        self.inner.lock_saved().restore(self.inner.style.as_ref());
        self.inner.set_trigger(false);
    }
}

impl Drop for Tracker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracker")
            .field("identifier", &self.identifier())
            .field("phase", &self.phase())
            .finish()
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, CycleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_saved(&self) -> MutexGuard<'_, SavedStyles> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn show(&self, lines: &[String]) {
        if let Some(sink) = &self.sink {
            sink.display(lines);
        }
    }

    fn set_trigger(&self, enabled: bool) {
        if let Some(trigger) = &self.trigger {
            trigger.set_enabled(enabled);
        }
    }

    fn start(this: &Arc<Self>) {
        this.set_trigger(false);
        {
            let mut state = this.lock_state();
            state.phase = Phase::Idle;
            Self::arm(this, &mut state);
        }
        let id = &this.config.identifier;
        info!(identifier = %id, "Tracker: initialized");
        this.show(&[format!("The {id} tracker has been initialized!")]);
    }

    /// Schedule the transition out of the current phase
    fn arm(this: &Arc<Self>, state: &mut CycleState) {
        let delay = match state.phase {
            Phase::Idle => this.config.idle_frequency(),
            Phase::Active => this.config.active_duration(),
            Phase::Uninitialized => return,
        };
        let weak: Weak<Self> = Arc::downgrade(this);
        let handle = this.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Inner::on_timer(&inner);
                }
            }),
        );
        state.timer = Some(handle);
    }

    /// Flip the phase and re-arm under the lock, then update the host
    fn on_timer(this: &Arc<Self>) {
        let entered = {
            let mut state = this.lock_state();
            state.timer = None;
            let current = state.phase;
            state.phase = match current {
                Phase::Idle => {
                    state.activations += 1;
                    Phase::Active
                }
                Phase::Active => Phase::Idle,
                Phase::Uninitialized => return,
            };
            Self::arm(this, &mut state);
            debug!(
                identifier = %this.config.identifier,
                phase = %state.phase,
                activations = state.activations,
                "Tracker: phase changed"
            );
            state.phase
        };

        match entered {
            Phase::Active => this.activate(),
            Phase::Idle => this.deactivate(),
            Phase::Uninitialized => {}
        }
    }

    /// Whether `phase` is still current; a shutdown may have overtaken it
    fn still(&self, phase: Phase) -> bool {
        self.lock_state().phase == phase
    }

    fn activate(&self) {
        {
            let mut saved = self.lock_saved();
            if !self.still(Phase::Active) {
                return;
            }
            for (name, value) in highlight_overrides(&self.config.identifier) {
                saved.override_property(self.style.as_ref(), name, &value);
            }
        }
        self.set_trigger(true);
    }

    fn deactivate(&self) {
        {
            let saved = self.lock_saved();
            if !self.still(Phase::Idle) {
                return;
            }
            saved.restore(self.style.as_ref());
        }
        self.set_trigger(false);
    }
}
