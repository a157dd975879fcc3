//! Timer scheduling for tracker phase cycles
//!
//! Every call to [`Scheduler::schedule`] returns a [`TimerHandle`] that can
//! cancel the pending task. Trackers keep the handle of their next
//! transition and cancel it on teardown, so no callback fires against a
//! disposed tracker.
//!
//! Two implementations:
//! - [`TokioScheduler`] - real time, one tokio task per timer
//! - [`ManualScheduler`] - virtual clock advanced explicitly (simulation, tests)

mod handle;
mod manual;
mod runtime;

use std::time::Duration;

pub use handle::{TimerGuard, TimerHandle};
pub use manual::{MAX_FIRINGS_PER_ADVANCE, ManualScheduler};
pub use runtime::TokioScheduler;

/// Work run once when a timer expires
pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Something that can run a task after a delay
pub trait Scheduler: Send + Sync {
    /// Run `task` once after `delay`, unless the returned handle is cancelled first
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle;
}
