//! Virtual-clock scheduler
//!
//! Time only moves when [`ManualScheduler::advance`] is called, which makes
//! phase cycles reproducible for `tb simulate` and for tests.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use super::{Scheduler, TimerGuard, TimerHandle, TimerTask};

/// Upper bound on timers fired by a single `advance` call
///
/// Zero-length cycles (both durations 0) would otherwise reschedule at the
/// same instant forever.
pub const MAX_FIRINGS_PER_ADVANCE: usize = 100_000;

struct Pending {
    guard: TimerGuard,
    task: TimerTask,
}

#[derive(Default)]
struct Clock {
    now: Duration,
    next_id: u64,
    /// Keyed by (deadline, id) so ties fire in scheduling order
    timers: BTreeMap<(Duration, u64), Pending>,
}

/// Scheduler whose clock is advanced by hand
#[derive(Default)]
pub struct ManualScheduler {
    clock: Mutex<Clock>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Virtual time elapsed since creation
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Timers that have neither fired nor been cancelled
    pub fn pending(&self) -> usize {
        self.lock().timers.values().filter(|p| p.guard.is_pending()).count()
    }

    /// Earliest deadline among timers that can still fire
    pub fn next_deadline(&self) -> Option<Duration> {
        self.lock()
            .timers
            .iter()
            .find(|(_, pending)| pending.guard.is_pending())
            .map(|(&(deadline, _), _)| deadline)
    }

    /// Move the clock forward by `by`, firing every timer that falls due
    ///
    /// Timers scheduled by callbacks during the advance fire too if their
    /// deadline is inside the window. Returns the number of tasks run.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.lock().now + by;
        debug!(target_ms = target.as_millis() as u64, "ManualScheduler::advance: called");
        let mut fired = 0;

        loop {
            // Pop under the lock, run without it: tasks schedule new timers
            let due = {
                let mut clock = self.lock();
                let key = match clock.timers.keys().next() {
                    Some(&(deadline, id)) if deadline <= target => (deadline, id),
                    _ => break,
                };
                clock.now = key.0;
                clock.timers.remove(&key)
            };

            let Some(pending) = due else { continue };
            if !pending.guard.try_fire() {
                continue;
            }
            (pending.task)();
            fired += 1;
            if fired >= MAX_FIRINGS_PER_ADVANCE {
                warn!(fired, "ManualScheduler::advance: firing budget exhausted");
                break;
            }
        }

        let mut clock = self.lock();
        if clock.now < target {
            clock.now = target;
        }
        fired
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: TimerTask) -> TimerHandle {
        let mut clock = self.lock();
        let id = clock.next_id;
        clock.next_id += 1;
        let deadline = clock.now + delay;
        debug!(timer_id = id, deadline_ms = deadline.as_millis() as u64, "ManualScheduler::schedule: called");

        let (handle, guard) = TimerHandle::pair(id);
        clock.timers.insert((deadline, id), Pending { guard, task });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn push(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> TimerTask {
        let log = Arc::clone(log);
        Box::new(move || log.lock().unwrap().push(label))
    }

    #[test]
    fn test_nothing_fires_before_deadline() {
        let scheduler = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _h = scheduler.schedule(ms(100), push(&log, "a"));

        assert_eq!(scheduler.advance(ms(99)), 0);
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(scheduler.now(), ms(99));

        assert_eq!(scheduler.advance(ms(1)), 1);
        assert_eq!(*log.lock().unwrap(), vec!["a"]);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn test_fires_in_deadline_then_schedule_order() {
        let scheduler = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let _c = scheduler.schedule(ms(30), push(&log, "c"));
        let _a = scheduler.schedule(ms(10), push(&log, "a"));
        let _b = scheduler.schedule(ms(10), push(&log, "b"));

        scheduler.advance(ms(50));
        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cancelled_timer_is_skipped() {
        let scheduler = ManualScheduler::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let handle = scheduler.schedule(ms(10), push(&log, "a"));
        assert_eq!(scheduler.pending(), 1);

        assert!(handle.cancel());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(scheduler.advance(ms(20)), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_next_deadline_skips_cancelled() {
        let scheduler = ManualScheduler::new();
        assert_eq!(scheduler.next_deadline(), None);

        let log = Arc::new(Mutex::new(Vec::new()));
        let early = scheduler.schedule(ms(10), push(&log, "a"));
        let _late = scheduler.schedule(ms(30), push(&log, "b"));
        assert_eq!(scheduler.next_deadline(), Some(ms(10)));

        assert!(early.cancel());
        assert_eq!(scheduler.next_deadline(), Some(ms(30)));

        scheduler.advance(ms(30));
        assert_eq!(scheduler.next_deadline(), None);
    }

    #[test]
    fn test_rescheduling_inside_window_fires() {
        let scheduler = Arc::new(ManualScheduler::new());
        let log = Arc::new(Mutex::new(Vec::new()));

        let inner_sched = Arc::clone(&scheduler);
        let inner_log = Arc::clone(&log);
        let _h = scheduler.schedule(
            ms(10),
            Box::new(move || {
                inner_log.lock().unwrap().push("first");
                let log = Arc::clone(&inner_log);
                let _next = inner_sched.schedule(ms(10), Box::new(move || log.lock().unwrap().push("second")));
            }),
        );

        assert_eq!(scheduler.advance(ms(25)), 2);
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_clock_observed_by_callback_is_deadline() {
        let scheduler = Arc::new(ManualScheduler::new());
        let seen = Arc::new(Mutex::new(None));
        let sched = Arc::clone(&scheduler);
        let slot = Arc::clone(&seen);
        let _h = scheduler.schedule(ms(40), Box::new(move || *slot.lock().unwrap() = Some(sched.now())));

        scheduler.advance(ms(100));
        assert_eq!(*seen.lock().unwrap(), Some(ms(40)));
        assert_eq!(scheduler.now(), ms(100));
    }
}
